use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use super::params::HeatmapQuery;
use super::{today, AppState};
use crate::analysis::heatmap::{load_heatmap, HeatmapGrid};
use crate::error::Result;
use crate::models::{IndicatorsByFactor, LISTING_FACTORS};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/heatmap", get(heatmap))
        .route("/api/indicators", get(indicators))
}

async fn heatmap(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HeatmapQuery>,
) -> Result<Json<HeatmapGrid>> {
    let (end, days) = q.window(state.defaults.heatmap_days, today())?;
    let hidden = state.registry.hidden_ids();
    let grid = load_heatmap(state.store.as_ref(), &hidden, end, days).await?;
    Ok(Json(grid))
}

async fn indicators(State(state): State<Arc<AppState>>) -> Result<Json<IndicatorsByFactor>> {
    let active = state.store.active_indicators().await?;
    Ok(Json(IndicatorsByFactor::group_seeded(&LISTING_FACTORS, active)))
}
