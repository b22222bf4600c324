pub mod heatmap;
pub mod params;
pub mod series;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::RangeDefaults;
use crate::core::store::SeriesStore;
use crate::indicators::registry::PairRegistry;

/// Shared read-only request context.
pub struct AppState {
    pub store: Arc<dyn SeriesStore>,
    pub registry: Arc<PairRegistry>,
    pub defaults: RangeDefaults,
}

impl AppState {
    pub fn new(store: Arc<dyn SeriesStore>, registry: Arc<PairRegistry>, defaults: RangeDefaults) -> Arc<Self> {
        Arc::new(Self {
            store,
            registry,
            defaults,
        })
    }
}

/// Assemble the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(series::routes())
        .merge(heatmap::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
