pub mod config;
pub mod errors;
pub mod models;
pub mod pricing;
pub mod services;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Подключает вывод логов: фильтр из `RUST_LOG`, JSON в production.
pub fn init_tracing(app: &config::AppConfig) {
    let filter = tracing_subscriber::EnvFilter::new(&app.rust_log);
    let registry = tracing_subscriber::registry().with(filter);

    if app.environment == "production" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
