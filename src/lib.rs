pub mod api;
pub mod booking;
pub mod config;
pub mod db;
pub mod engine;

pub use db::DbPool;

use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::booking::Catalog;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub catalog: Arc<Catalog>,
    pub rate_limiter: Arc<RateLimiter>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Self {
            config,
            db,
            catalog: Arc::new(Catalog::seeded()),
            rate_limiter,
            metrics_handle: None,
        }
    }

    /// Set the Prometheus metrics handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}
