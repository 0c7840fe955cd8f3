pub mod offer;
pub mod price_category;
pub mod stock;

pub use offer::{Offer, OfferId};
pub use price_category::{
    PriceCategory, PriceCategoryFormValues, PriceCategoryId, DEFAULT_PRICE_CATEGORY_LABEL,
};
pub use stock::{Stock, StockIndex, StocksPage};
