use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::params::{parse_max_points, CombinedQuery, SeriesQuery};
use super::{today, AppState};
use crate::analysis::sampling::downsample;
use crate::analysis::statistics::{summarize, Stats};
use crate::core::alerts::detect_alert_ranges;
use crate::core::orchestrator::{assemble_combined, CombinedIndicatorView};
use crate::error::{AppError, Result};
use crate::models::{AlertRange, Indicator, Observation};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResponse {
    pub indicator: Indicator,
    pub data: Vec<Observation>,
    pub stats: Stats,
    pub alert_ranges: Vec<AlertRange>,
}

// ── Route definitions ────────────────────────────────────────────────────

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/data/combined", get(combined_series))
        .route("/api/data/:indicator_id", get(indicator_series))
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn indicator_series(
    State(state): State<Arc<AppState>>,
    Path(indicator_id): Path<String>,
    Query(q): Query<SeriesQuery>,
) -> Result<Json<SeriesResponse>> {
    let range = q.range(state.defaults.series_days, today())?;
    let max_points = parse_max_points(q.max_points.as_deref())?;

    let (indicator, series) = tokio::join!(
        state.store.active_indicator(&indicator_id),
        state.store.fetch_series(&indicator_id, &range),
    );
    let indicator = indicator?
        .ok_or_else(|| AppError::NotFound(format!("Indicator '{}' not found", indicator_id)))?;
    let series = series?;

    info!("Series '{}' {}..{}: {} points", indicator_id, range.start, range.end, series.len());

    let stats = summarize(&series);
    let alert_ranges = detect_alert_ranges(series.points());
    let data = match max_points {
        Some(max) => downsample(series.points(), max),
        None => series.into_inner(),
    };

    Ok(Json(SeriesResponse {
        indicator,
        data,
        stats,
        alert_ranges,
    }))
}

async fn combined_series(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CombinedQuery>,
) -> Result<Json<CombinedIndicatorView>> {
    let main_indicator = q.main_indicator()?;
    let range = q.range(state.defaults.combined_days, today())?;
    let max_points = parse_max_points(q.max_points.as_deref())?;

    let view = assemble_combined(state.store.as_ref(), &state.registry, main_indicator, &range).await?;

    Ok(Json(match max_points {
        Some(max) => view.downsampled(max),
        None => view,
    }))
}
