use serde::{Deserialize, Serialize};

use crate::models::PriceCategoryId;

/// Сток оффера (сеанс или единица товара). Только для чтения.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: i64,
    #[serde(default)]
    pub price_category_id: Option<PriceCategoryId>,
    #[serde(default)]
    pub bookings_quantity: u32,
}

/// Страница ответа `GET /offers/{offer_id}/stocks/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StocksPage {
    pub stocks: Vec<Stock>,
    pub total_stock_count: u32,
}

/// Все стоки оффера с поиском по тарифу.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockIndex {
    stocks: Vec<Stock>,
}

impl StockIndex {
    pub fn new(stocks: Vec<Stock>) -> Self {
        Self { stocks }
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stock> {
        self.stocks.iter()
    }

    /// Стоки, ссылающиеся на тариф.
    pub fn referencing(&self, id: PriceCategoryId) -> impl Iterator<Item = &Stock> {
        self.stocks
            .iter()
            .filter(move |stock| stock.price_category_id == Some(id))
    }

    pub fn is_referenced(&self, id: PriceCategoryId) -> bool {
        self.referencing(id).next().is_some()
    }

    /// Тариф "забронирован", если хотя бы у одного его стока есть бронирования.
    pub fn is_booked(&self, id: PriceCategoryId) -> bool {
        self.referencing(id).any(|stock| stock.bookings_quantity > 0)
    }
}

impl FromIterator<Stock> for StockIndex {
    fn from_iter<I: IntoIterator<Item = Stock>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Extend<Stock> for StockIndex {
    fn extend<I: IntoIterator<Item = Stock>>(&mut self, iter: I) {
        self.stocks.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(id: i64, category: Option<i64>, bookings: u32) -> Stock {
        Stock {
            id,
            price_category_id: category.map(PriceCategoryId),
            bookings_quantity: bookings,
        }
    }

    #[test]
    fn booked_only_when_a_referencing_stock_has_bookings() {
        let index: StockIndex = vec![
            stock(1, Some(42), 0),
            stock(2, Some(42), 3),
            stock(3, Some(7), 0),
            stock(4, None, 9),
        ]
        .into_iter()
        .collect();

        assert!(index.is_booked(PriceCategoryId(42)));
        assert!(index.is_referenced(PriceCategoryId(7)));
        assert!(!index.is_booked(PriceCategoryId(7)));
        assert!(!index.is_referenced(PriceCategoryId(666)));
    }

    #[test]
    fn stock_ignores_extra_wire_fields() {
        let stock: Stock = serde_json::from_str(
            r#"{
                "id": 5,
                "priceCategoryId": 42,
                "bookingsQuantity": 2,
                "price": 10.5,
                "beginningDatetime": "2026-12-01T20:00:00Z",
                "isEventDeletable": true
            }"#,
        )
        .unwrap();
        assert_eq!(stock.price_category_id, Some(PriceCategoryId(42)));
        assert_eq!(stock.bookings_quantity, 2);
    }
}
