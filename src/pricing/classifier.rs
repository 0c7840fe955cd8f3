//! Классификация правки тарифов: нужно ли подтверждение перед сохранением.
//!
//! Изменение цены тарифа, который уже используется стоком, применяется ко всем
//! датам этого тарифа. Если по таким стокам уже есть бронирования, пользователь
//! должен увидеть, что прошлые брони сохраняют исходную цену.

use crate::models::{PriceCategoryFormValues, StockIndex};

/// Тип окна подтверждения для правки тарифов.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopinType {
    /// Подтверждение не требуется.
    None,
    /// Цена изменена у тарифа, на который ссылается сток.
    PriceChange,
    /// Цена изменена у тарифа, по стокам которого уже есть бронирования.
    PriceChangeWithBooking,
}

impl PopinType {
    pub fn requires_confirmation(self) -> bool {
        !matches!(self, PopinType::None)
    }

    pub fn title(self) -> &'static str {
        match self {
            PopinType::None => "",
            PopinType::PriceChange | PopinType::PriceChangeWithBooking => {
                "Cette modification de tarif s’appliquera à l’ensemble des dates qui y sont associées."
            }
        }
    }

    pub fn message(self) -> Option<&'static str> {
        match self {
            PopinType::PriceChangeWithBooking => Some(
                "Le tarif restera inchangé pour les personnes ayant déjà réservé cette offre.",
            ),
            _ => None,
        }
    }
}

/// Сравнивает начальные и отправляемые значения формы с учётом стоков оффера.
///
/// Правки только названий никогда не требуют подтверждения. Тарифы, созданные
/// в этой же сессии (без `id` в начальных значениях), тоже пропускаются.
pub fn get_popin_type(
    stocks: &StockIndex,
    initial_values: &PriceCategoryFormValues,
    values: &PriceCategoryFormValues,
) -> PopinType {
    if stocks.is_empty() {
        return PopinType::None;
    }

    let mut price_changed = false;
    let mut booked_price_changed = false;

    for category in &values.price_categories {
        let Some(id) = category.id else { continue };
        let Some(initial) = initial_values.find(id) else { continue };
        if !stocks.is_referenced(id) || initial.price == category.price {
            continue;
        }

        price_changed = true;
        if stocks.is_booked(id) {
            booked_price_changed = true;
            break;
        }
    }

    match (price_changed, booked_price_changed) {
        (_, true) => PopinType::PriceChangeWithBooking,
        (true, false) => PopinType::PriceChange,
        _ => PopinType::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceCategory, PriceCategoryId, Stock};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn stocks(items: &[(i64, u32)]) -> StockIndex {
        items
            .iter()
            .enumerate()
            .map(|(n, (category, bookings))| Stock {
                id: n as i64 + 1,
                price_category_id: Some(PriceCategoryId(*category)),
                bookings_quantity: *bookings,
            })
            .collect()
    }

    fn values(categories: Vec<PriceCategory>) -> PriceCategoryFormValues {
        PriceCategoryFormValues {
            price_categories: categories,
            is_duo: false,
        }
    }

    fn price(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn price_change_on_stock_without_bookings() {
        let initial = values(vec![PriceCategory::persisted(42, "Plein tarif", price(314))]);
        let edited = values(vec![PriceCategory::persisted(42, "Plein tarif", price(1000))]);

        assert_eq!(get_popin_type(&stocks(&[(42, 0)]), &initial, &edited), PopinType::PriceChange);
    }

    #[test]
    fn price_change_on_booked_stock() {
        let initial = values(vec![PriceCategory::persisted(42, "Plein tarif", price(314))]);
        let edited = values(vec![PriceCategory::persisted(42, "Plein tarif", price(1000))]);

        assert_eq!(
            get_popin_type(&stocks(&[(42, 1)]), &initial, &edited),
            PopinType::PriceChangeWithBooking
        );
    }

    #[test]
    fn unrelated_stock_does_not_trigger() {
        let initial = values(vec![PriceCategory::persisted(42, "Plein tarif", price(314))]);
        let edited = values(vec![PriceCategory::persisted(42, "Plein tarif", price(1000))]);

        assert_eq!(get_popin_type(&stocks(&[(666, 3)]), &initial, &edited), PopinType::None);
    }

    #[test]
    fn booked_category_wins_over_plain_change() {
        let initial = values(vec![
            PriceCategory::persisted(1, "Plein tarif", price(2000)),
            PriceCategory::persisted(2, "Réduit", price(1000)),
        ]);
        let edited = values(vec![
            PriceCategory::persisted(1, "Plein tarif", price(2500)),
            PriceCategory::persisted(2, "Réduit", price(1200)),
        ]);

        assert_eq!(
            get_popin_type(&stocks(&[(1, 0), (2, 4)]), &initial, &edited),
            PopinType::PriceChangeWithBooking
        );
    }

    #[test]
    fn bookings_on_unchanged_category_do_not_escalate() {
        let initial = values(vec![
            PriceCategory::persisted(1, "Plein tarif", price(2000)),
            PriceCategory::persisted(2, "Réduit", price(1000)),
        ]);
        let edited = values(vec![
            PriceCategory::persisted(1, "Plein tarif", price(2500)),
            PriceCategory::persisted(2, "Réduit", price(1000)),
        ]);

        assert_eq!(
            get_popin_type(&stocks(&[(1, 0), (2, 4)]), &initial, &edited),
            PopinType::PriceChange
        );
    }

    #[test]
    fn copy_mentions_past_bookings_only_with_booking() {
        assert!(PopinType::PriceChange.message().is_none());
        assert!(PopinType::PriceChangeWithBooking
            .message()
            .is_some_and(|m| m.contains("déjà réservé")));
        assert!(!PopinType::None.requires_confirmation());
    }

    fn category_strategy() -> impl Strategy<Value = (i64, String, i64)> {
        (1i64..20, "[a-z]{1,10}", 0i64..30_000)
    }

    fn stock_strategy() -> impl Strategy<Value = Vec<(i64, u32)>> {
        prop::collection::vec((1i64..20, 0u32..3), 0..8)
    }

    proptest! {
        #[test]
        fn prop_empty_stocks_never_require_confirmation(
            initial in prop::collection::vec(category_strategy(), 0..6),
            current in prop::collection::vec(category_strategy(), 0..6),
        ) {
            let to_values = |items: &[(i64, String, i64)]| values(
                items.iter().map(|(id, label, cents)| PriceCategory::persisted(*id, label.clone(), price(*cents))).collect()
            );
            prop_assert_eq!(
                get_popin_type(&StockIndex::default(), &to_values(&initial), &to_values(&current)),
                PopinType::None
            );
        }

        #[test]
        fn prop_label_only_changes_never_require_confirmation(
            categories in prop::collection::vec(("[a-z]{1,10}", 0i64..30_000), 1..6),
            new_label in "[A-Z]{1,10}",
            stock_layout in stock_strategy(),
        ) {
            // id по позиции, чтобы не было дублей
            let initial = values(categories.iter().enumerate().map(|(n, (label, cents))| PriceCategory::persisted(n as i64 + 1, label.clone(), price(*cents))).collect());
            let edited = values(categories.iter().enumerate().map(|(n, (_, cents))| PriceCategory::persisted(n as i64 + 1, new_label.clone(), price(*cents))).collect());
            prop_assert_eq!(get_popin_type(&stocks(&stock_layout), &initial, &edited), PopinType::None);
        }

        #[test]
        fn prop_freshly_created_categories_never_trigger(
            id in 1i64..20,
            old_cents in 0i64..30_000,
            new_cents in 0i64..30_000,
            bookings in 0u32..3,
        ) {
            // в начальных значениях тарифа ещё нет id
            let initial = values(vec![PriceCategory::new("Nouveau", price(old_cents))]);
            let edited = values(vec![PriceCategory::persisted(id, "Nouveau", price(new_cents))]);
            prop_assert_eq!(get_popin_type(&stocks(&[(id, bookings)]), &initial, &edited), PopinType::None);
        }

        #[test]
        fn prop_price_delta_classification_follows_bookings(
            id in 1i64..20,
            old_cents in 0i64..30_000,
            delta in 1i64..5_000,
            bookings in prop::collection::vec(0u32..3, 1..4),
        ) {
            let initial = values(vec![PriceCategory::persisted(id, "Plein tarif", price(old_cents))]);
            let edited = values(vec![PriceCategory::persisted(id, "Plein tarif", price(old_cents + delta))]);
            let layout: Vec<(i64, u32)> = bookings.iter().map(|b| (id, *b)).collect();
            let expected = if bookings.iter().any(|b| *b > 0) {
                PopinType::PriceChangeWithBooking
            } else {
                PopinType::PriceChange
            };
            prop_assert_eq!(get_popin_type(&stocks(&layout), &initial, &edited), expected);
        }
    }
}
