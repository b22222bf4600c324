use crate::core::store::SeriesStore;
use crate::error::Result;
use crate::models::{DateRange, Indicator, IndicatorsByFactor, Observation, Status};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub status: Option<Status>,
    pub status_reason: Option<String>,
    pub value: f64,
}

/// Dense indicator x date status matrix behind the overview heatmap.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapGrid {
    pub dates: Vec<NaiveDate>,
    pub indicators: IndicatorsByFactor,
    /// indicator id -> "YYYY-MM-DD" -> cell, `null` where no observation exists
    #[serde(rename = "statusMap")]
    pub status_map: BTreeMap<String, BTreeMap<String, Option<HeatmapCell>>>,
}

impl HeatmapGrid {
    /// `None` for an absent cell, including ids or dates outside the grid.
    pub fn cell(&self, indicator_id: &str, date: NaiveDate) -> Option<&HeatmapCell> {
        self.status_map
            .get(indicator_id)
            .and_then(|row| row.get(&date_key(date)))
            .and_then(Option::as_ref)
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `days` consecutive calendar days ending at `end`, oldest first. Days
/// before the earliest representable date are dropped.
pub fn dense_dates(end: NaiveDate, days: usize) -> Vec<NaiveDate> {
    (0..days as i64)
        .rev()
        .filter_map(|offset| end.checked_sub_signed(Duration::days(offset)))
        .collect()
}

/// Fills the grid from a flat observation list.
///
/// Observations are indexed once by (indicator, date), so every cell is a
/// single hash lookup. Inactive and `hidden` indicators are left out of both
/// the grouping and the status map.
pub fn build_grid(
    indicators: Vec<Indicator>,
    hidden: &HashSet<String>,
    dates: Vec<NaiveDate>,
    observations: Vec<(String, Observation)>,
) -> HeatmapGrid {
    let visible: Vec<Indicator> = indicators
        .into_iter()
        .filter(|i| i.is_active && !hidden.contains(&i.id))
        .collect();

    let mut lookup: HashMap<(String, NaiveDate), Observation> = HashMap::with_capacity(observations.len());
    for (indicator_id, observation) in observations {
        lookup.insert((indicator_id, observation.date), observation);
    }

    let date_keys: Vec<String> = dates.iter().map(|d| date_key(*d)).collect();
    let mut status_map = BTreeMap::new();

    for indicator in &visible {
        let mut row = BTreeMap::new();
        let mut key = (indicator.id.clone(), NaiveDate::MIN);
        for (date, date_str) in dates.iter().zip(&date_keys) {
            key.1 = *date;
            let cell = lookup.get(&key).map(|o| HeatmapCell {
                status: o.status,
                status_reason: o.status_reason.clone(),
                value: o.value,
            });
            row.insert(date_str.clone(), cell);
        }
        status_map.insert(indicator.id.clone(), row);
    }

    HeatmapGrid {
        dates,
        indicators: IndicatorsByFactor::group(visible),
        status_map,
    }
}

/// Loads all active indicators and the window's observations (one bulk
/// query each) and builds the grid for `days` days ending at `end`.
pub async fn load_heatmap(
    store: &dyn SeriesStore,
    hidden: &HashSet<String>,
    end: NaiveDate,
    days: usize,
) -> Result<HeatmapGrid> {
    let dates = dense_dates(end, days);
    let range = match (dates.first(), dates.last()) {
        (Some(&start), Some(&last)) => DateRange::new(start, last),
        _ => DateRange::new(end, end),
    };

    let indicators = store.active_indicators().await?;
    let observations = store.fetch_window(&range).await?;

    info!(
        "Heatmap {}..{}: {} indicators, {} observations",
        range.start,
        range.end,
        indicators.len(),
        observations.len()
    );

    Ok(build_grid(indicators, hidden, dates, observations))
}
