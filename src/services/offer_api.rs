//! offer_api.rs
//!
//! Клиент pro API для экрана тарифов.
//!
//! Ключевые компоненты:
//! 1.  **OfferApi**: трейт с вызовами, которые нужны сценарию сохранения тарифов.
//!     Через него оркестратор тестируется без сети.
//! 2.  **HttpOfferApi**: реализация на `reqwest`. Все сетевые вызовы проходят
//!     через `CircuitBreaker`, как и в остальных клиентах внешних сервисов.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::config::{ApiConfig, CircuitBreakerConfig};
use crate::errors::ApiError;
use crate::models::{Offer, OfferId, PriceCategory, PriceCategoryId, StockIndex, StocksPage};
use crate::services::circuit_breaker::{CircuitBreaker, CircuitState};

/// Тело `PATCH /offers/{offer_id}`: только изменённые поля.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOfferBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_duo: Option<bool>,
}

/// Тело `POST /offers/{offer_id}/price_categories`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceCategoryBody<'a> {
    price_categories: &'a [PriceCategory],
}

#[async_trait]
pub trait OfferApi: Send + Sync {
    async fn get_offer(&self, offer_id: OfferId) -> Result<Offer, ApiError>;

    async fn get_stocks_page(
        &self,
        offer_id: OfferId,
        page: u32,
    ) -> Result<StocksPage, ApiError>;

    async fn patch_offer(&self, offer_id: OfferId, body: &PatchOfferBody) -> Result<Offer, ApiError>;

    async fn post_price_categories(
        &self,
        offer_id: OfferId,
        price_categories: &[PriceCategory],
    ) -> Result<Offer, ApiError>;

    async fn delete_price_category(
        &self,
        offer_id: OfferId,
        price_category_id: PriceCategoryId,
    ) -> Result<(), ApiError>;

    /// Собирает все страницы стоков оффера.
    async fn get_all_stocks(&self, offer_id: OfferId) -> Result<StockIndex, ApiError> {
        let mut index = StockIndex::default();
        let mut page = 1;

        loop {
            let StocksPage { stocks, total_stock_count } = self.get_stocks_page(offer_id, page).await?;
            let fetched = stocks.len();
            index.extend(stocks);

            if fetched == 0 || index.len() >= total_stock_count as usize {
                break;
            }
            page += 1;
        }

        Ok(index)
    }
}

/// Клиент pro API поверх `reqwest`.
#[derive(Clone)]
pub struct HttpOfferApi {
    base_url: String,
    stocks_page_size: u32,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl HttpOfferApi {
    pub fn from_config(
        api: &ApiConfig,
        circuit_breaker: &CircuitBreakerConfig,
    ) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            stocks_page_size: api.stocks_page_size.max(1),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::from_config(circuit_breaker)),
        })
    }

    pub fn get_circuit_breaker_status(&self) -> (CircuitState, u32) {
        (
            self.circuit_breaker.get_state(),
            self.circuit_breaker.failure_count(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Выполняет запрос через Circuit Breaker и проверяет статус ответа.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking pro API request");
            return Err(ApiError::CircuitOpen);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("pro API request failed: {:?}", e);
                self.circuit_breaker.record_failure();
                return Err(ApiError::Http(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            self.circuit_breaker.record_success();
            return Ok(response);
        }

        // 4xx - ошибка запроса, сервис при этом жив
        if status.is_server_error() {
            self.circuit_breaker.record_failure();
        } else {
            self.circuit_breaker.record_success();
        }
        let body = response.text().await.unwrap_or_default();
        error!("pro API answered {}: {}", status, body);
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl OfferApi for HttpOfferApi {
    async fn get_offer(&self, offer_id: OfferId) -> Result<Offer, ApiError> {
        info!("Fetching offer {}", offer_id);
        let request = self.http_client.get(self.url(&format!("/offers/{}", offer_id)));
        Ok(self.execute(request).await?.json::<Offer>().await?)
    }

    async fn get_stocks_page(&self, offer_id: OfferId, page: u32) -> Result<StocksPage, ApiError> {
        info!("Fetching stocks of offer {}: page={}", offer_id, page);
        let request = self
            .http_client
            .get(self.url(&format!("/offers/{}/stocks/", offer_id)))
            .query(&[
                ("page", page.to_string()),
                ("stocks_limit_per_page", self.stocks_page_size.to_string()),
            ]);
        Ok(self.execute(request).await?.json::<StocksPage>().await?)
    }

    async fn patch_offer(&self, offer_id: OfferId, body: &PatchOfferBody) -> Result<Offer, ApiError> {
        info!("Patching offer {}: {:?}", offer_id, body);
        let request = self
            .http_client
            .patch(self.url(&format!("/offers/{}", offer_id)))
            .json(body);
        Ok(self.execute(request).await?.json::<Offer>().await?)
    }

    async fn post_price_categories(
        &self,
        offer_id: OfferId,
        price_categories: &[PriceCategory],
    ) -> Result<Offer, ApiError> {
        info!(
            "Upserting {} price categories for offer {}",
            price_categories.len(),
            offer_id
        );
        let request = self
            .http_client
            .post(self.url(&format!("/offers/{}/price_categories", offer_id)))
            .json(&PriceCategoryBody { price_categories });
        Ok(self.execute(request).await?.json::<Offer>().await?)
    }

    async fn delete_price_category(
        &self,
        offer_id: OfferId,
        price_category_id: PriceCategoryId,
    ) -> Result<(), ApiError> {
        info!("Deleting price category {} of offer {}", price_category_id, offer_id);
        let request = self.http_client.delete(self.url(&format!(
            "/offers/{}/price_categories/{}",
            offer_id, price_category_id
        )));
        self.execute(request).await?;
        Ok(())
    }
}
