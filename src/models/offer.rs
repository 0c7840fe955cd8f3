use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::PriceCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(pub i64);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Оффер в том виде, в котором его отдаёт `GET /offers/{offer_id}`.
/// Лишние поля ответа игнорируются.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: OfferId,
    pub name: String,
    #[serde(default)]
    pub is_duo: bool,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub price_categories: Vec<PriceCategory>,
}

// API отдаёт `priceCategories: null` для офферов без тарифов
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_price_categories_become_empty() {
        let offer: Offer = serde_json::from_str(
            r#"{ "id": 12, "name": "Visite guidée", "isDuo": false, "priceCategories": null, "status": "ACTIVE" }"#,
        )
        .unwrap();
        assert!(offer.price_categories.is_empty());
        assert_eq!(offer.id, OfferId(12));
    }
}
