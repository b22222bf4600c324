use crate::models::{Series, Status};
use serde::Serialize;

/// Alert summary of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_days: usize,
    pub alert_days: usize,
    /// Percentage in [0, 100], one decimal.
    pub alert_rate: f64,
    pub latest_value: f64,
    pub latest_status: Option<Status>,
}

/// Summarizes `series`. "Latest" is the last element of the ascending
/// series, `0` / `null` when the series is empty.
pub fn summarize(series: &Series) -> Stats {
    let total_days = series.len();
    let alert_days = series.iter().filter(|p| p.is_alert()).count();

    let alert_rate = if total_days > 0 {
        round_one_decimal(alert_days as f64 / total_days as f64 * 100.0)
    } else {
        0.0
    };

    let latest = series.last();

    Stats {
        total_days,
        alert_days,
        alert_rate,
        latest_value: latest.map(|p| p.value).unwrap_or(0.0),
        latest_status: latest.and_then(|p| p.status),
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
