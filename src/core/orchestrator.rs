use crate::analysis::sampling::downsample;
use crate::analysis::statistics::{summarize, Stats};
use crate::core::alerts::detect_alert_ranges;
use crate::core::resolver::resolve_first_available;
use crate::core::store::SeriesStore;
use crate::core::timeseries::{align_with_status, ComparisonPoint};
use crate::error::{AppError, Result};
use crate::indicators::registry::{PairLabels, PairRegistry};
use crate::models::{AlertRange, DateRange, Indicator, Series};
use serde::Serialize;
use tracing::{error, info, warn};

/// Base-vs-main comparison plus the spread that drives its alerts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedIndicatorView {
    pub main_indicator: Indicator,
    pub comparison_data: Vec<ComparisonPoint>,
    pub spread_data: Series,
    pub labels: PairLabels,
    /// Computed over the spread series.
    pub stats: Stats,
    /// Base candidate that supplied `value1`, `None` if none had data.
    pub base_source: Option<String>,
    pub alert_ranges: Vec<AlertRange>,
}

impl CombinedIndicatorView {
    /// Thins the plotted series only; stats and ranges keep full resolution.
    pub fn downsampled(mut self, max_points: usize) -> Self {
        self.comparison_data = downsample(&self.comparison_data, max_points);
        self.spread_data = Series::new(downsample(self.spread_data.points(), max_points));
        self
    }
}

/// Builds the combined view for `clicked_id`, which may be either the main or
/// the spread indicator of a configured pair.
///
/// Only the metadata lookup and the main series are required. A failing
/// spread fetch or base lookup degrades that leg to empty and is logged.
pub async fn assemble_combined(
    store: &dyn SeriesStore,
    registry: &PairRegistry,
    clicked_id: &str,
    range: &DateRange,
) -> Result<CombinedIndicatorView> {
    if clicked_id.trim().is_empty() {
        return Err(AppError::Validation("main_indicator is required".to_string()));
    }
    let pair = registry.get(clicked_id).ok_or_else(|| {
        AppError::Validation(format!("'{}' is not a combined indicator", clicked_id))
    })?;

    let main_indicator = resolve_display_indicator(store, clicked_id, &pair.main_indicator_id).await?;

    let (main, base, spread) = tokio::join!(
        store.fetch_series(&pair.main_indicator_id, range),
        resolve_first_available(store, &pair.base_candidate_ids, range),
        store.fetch_series(&pair.spread_indicator_id, range),
    );

    let main = main.map_err(|e| {
        error!("Main series '{}' failed: {}", pair.main_indicator_id, e);
        e
    })?;
    let spread = spread.unwrap_or_else(|e| {
        warn!("Spread series '{}' failed, continuing without it: {}", pair.spread_indicator_id, e);
        Series::empty()
    });

    if base.indicator_id.is_none() {
        warn!("No base candidate has data for pair '{}'", pair.pair_id);
    }

    let comparison_data = align_with_status(&base.series, &main, &spread);
    let stats = summarize(&spread);
    let alert_ranges = detect_alert_ranges(spread.points());

    info!(
        "Combined '{}' {}..{}: main={} base={} ({:?}) spread={} rows={}",
        pair.pair_id,
        range.start,
        range.end,
        main.len(),
        base.series.len(),
        base.indicator_id,
        spread.len(),
        comparison_data.len()
    );

    Ok(CombinedIndicatorView {
        main_indicator,
        comparison_data,
        spread_data: spread,
        labels: pair.labels.clone(),
        stats,
        base_source: base.indicator_id,
        alert_ranges,
    })
}

/// Clicked id's own metadata if active, else the pair's main indicator.
async fn resolve_display_indicator(
    store: &dyn SeriesStore,
    clicked_id: &str,
    main_id: &str,
) -> Result<Indicator> {
    match store.active_indicator(clicked_id).await {
        Ok(Some(indicator)) => return Ok(indicator),
        Ok(None) => {}
        Err(e) if clicked_id != main_id => {
            warn!("Metadata lookup for '{}' failed, trying '{}': {}", clicked_id, main_id, e);
        }
        Err(e) => return Err(e),
    }

    if clicked_id == main_id {
        return Err(AppError::NotFound(format!("Indicator '{}' not found", clicked_id)));
    }

    store
        .active_indicator(main_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Indicator '{}' not found", clicked_id)))
}
