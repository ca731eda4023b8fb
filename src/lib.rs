pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod explorer;
pub mod filters;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::explorer::FilterStateStore;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub filter_store: Arc<dyn FilterStateStore>,
}
