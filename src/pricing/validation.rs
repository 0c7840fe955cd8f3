//! Локальная проверка формы тарифов до любого сетевого вызова.

use rust_decimal::Decimal;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::models::PriceCategoryFormValues;

/// Максимальная цена индивидуального оффера, в евро.
pub const MAX_PRICE: Decimal = Decimal::from_parts(300, 0, 0, false, 0);

pub const MAX_PRICE_CATEGORIES: usize = 50;

/// Ошибка поля формы, показывается рядом с полем.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Путь к полю, например `priceCategories[1].label`.
    pub field: String,
    pub code: String,
    pub message: String,
}

pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("price_negative")
            .with_message(Cow::Borrowed("Le prix ne peut pas être négatif")));
    }
    if *price > MAX_PRICE {
        return Err(ValidationError::new("price_too_high").with_message(Cow::Borrowed(
            "Le prix d’une offre ne peut excéder 300 euros",
        )));
    }
    Ok(())
}

/// Пары (метка, цена) должны быть уникальны в пределах оффера.
pub fn validate_unique_categories(values: &PriceCategoryFormValues) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for category in &values.price_categories {
        if !seen.insert((category.label.trim(), category.price.normalize())) {
            return Err(ValidationError::new("price_category_not_unique").with_message(
                Cow::Borrowed("Plusieurs tarifs sont identiques"),
            ));
        }
    }
    Ok(())
}

/// Проверяет форму и возвращает плоский список ошибок полей.
pub fn validate_form(values: &PriceCategoryFormValues) -> Result<(), Vec<FieldError>> {
    let mut out = Vec::new();

    let count = values.price_categories.len();
    if count == 0 || count > MAX_PRICE_CATEGORIES {
        out.push(FieldError {
            field: "priceCategories".to_string(),
            code: "length".to_string(),
            message: format!(
                "Une offre doit avoir entre 1 et {} tarifs",
                MAX_PRICE_CATEGORIES
            ),
        });
    }

    if let Err(errors) = values.validate() {
        flatten("", &errors, &mut out);
    }

    if out.is_empty() {
        return Ok(());
    }
    out.sort_by(|a, b| a.field.cmp(&b.field));
    Err(out)
}

fn flatten(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let name: &str = &**field;
        let path = if name == "__all__" {
            if prefix.is_empty() { "form".to_string() } else { prefix.to_string() }
        } else {
            join(prefix, &camel_case(name))
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    out.push(FieldError {
                        field: path.clone(),
                        code: error.code.to_string(),
                        message: error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| error.code.to_string()),
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

// Пути ошибок в том же виде, что и поля в JSON
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceCategory;

    fn form(categories: Vec<PriceCategory>) -> PriceCategoryFormValues {
        PriceCategoryFormValues {
            price_categories: categories,
            is_duo: false,
        }
    }

    #[test]
    fn valid_form_passes() {
        let values = form(vec![
            PriceCategory::persisted(1, "Plein tarif", Decimal::new(2500, 2)),
            PriceCategory::new("Réduit", Decimal::ZERO),
        ]);
        assert_eq!(validate_form(&values), Ok(()));
    }

    #[test]
    fn empty_label_and_high_price_are_reported_per_field() {
        let values = form(vec![
            PriceCategory::new("Plein tarif", Decimal::TEN),
            PriceCategory::new("", Decimal::new(301, 0)),
        ]);

        let errors = validate_form(&values).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(fields, vec!["priceCategories[1].label", "priceCategories[1].price"]);
        assert_eq!(errors[1].code, "price_too_high");
    }

    #[test]
    fn negative_price_is_rejected() {
        let values = form(vec![PriceCategory::new("Plein tarif", Decimal::new(-1, 0))]);
        let errors = validate_form(&values).unwrap_err();
        assert_eq!(errors[0].code, "price_negative");
    }

    #[test]
    fn duplicate_label_and_price_is_rejected() {
        let values = form(vec![
            PriceCategory::new("Plein tarif", Decimal::new(10, 0)),
            PriceCategory::persisted(4, "Plein tarif", Decimal::new(1000, 2)),
        ]);
        let errors = validate_form(&values).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "form");
        assert_eq!(errors[0].code, "price_category_not_unique");
    }

    #[test]
    fn empty_form_is_rejected() {
        let errors = validate_form(&form(vec![])).unwrap_err();
        assert_eq!(errors[0].field, "priceCategories");
    }

    #[test]
    fn too_many_categories_is_rejected() {
        let categories = (0..=MAX_PRICE_CATEGORIES)
            .map(|n| PriceCategory::new(format!("Tarif {}", n), Decimal::ONE))
            .collect();
        let errors = validate_form(&form(categories)).unwrap_err();
        assert_eq!(errors[0].field, "priceCategories");
        assert_eq!(errors[0].code, "length");
    }
}
