use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::models::Offer;
use crate::pricing::validation::{validate_price, validate_unique_categories};

/// Метка единственного тарифа: когда тариф один, различать его не нужно.
pub const DEFAULT_PRICE_CATEGORY_LABEL: &str = "Tarif unique";

/// Серверный идентификатор тарифа.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceCategoryId(pub i64);

impl fmt::Display for PriceCategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Тариф оффера. `id == None` - тариф ещё не сохранён на сервере.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PriceCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PriceCategoryId>,
    #[validate(length(min = 1, max = 50, message = "Le libellé doit contenir entre 1 et 50 caractères"))]
    pub label: String,
    /// На проводе цена - JSON-число.
    #[validate(custom(function = "validate_price"))]
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl PriceCategory {
    pub fn new(label: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: None,
            label: label.into(),
            price,
        }
    }

    pub fn persisted(id: i64, label: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: Some(PriceCategoryId(id)),
            label: label.into(),
            price,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Значения формы тарифов, отправляются целиком.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_unique_categories"))]
pub struct PriceCategoryFormValues {
    #[validate(nested)]
    pub price_categories: Vec<PriceCategory>,
    #[serde(default)]
    pub is_duo: bool,
}

impl PriceCategoryFormValues {
    /// Начальные значения формы для оффера. Без тарифов - одна пустая строка "Tarif unique".
    pub fn from_offer(offer: &Offer) -> Self {
        let price_categories = if offer.price_categories.is_empty() {
            vec![PriceCategory::new(DEFAULT_PRICE_CATEGORY_LABEL, Decimal::ZERO)]
        } else {
            offer.price_categories.clone()
        };

        Self {
            price_categories,
            is_duo: offer.is_duo,
        }
    }

    pub fn find(&self, id: PriceCategoryId) -> Option<&PriceCategory> {
        self.price_categories
            .iter()
            .find(|category| category.id == Some(id))
    }
}
