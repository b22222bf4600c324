use crate::models::{Series, Status};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// One row of the base-vs-main comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    /// Base leg (e.g. VIX)
    pub value1: f64,
    /// Main leg (e.g. VIX3M)
    pub value2: f64,
    pub status: Option<Status>,
    pub status_reason: Option<String>,
}

/// Inner-joins `base` and `main` on date and decorates each row with the
/// status of `status_source` on that date (`None` if it has no row there).
///
/// Status never comes from either joined leg: for combined pairs the alert
/// rule is defined on the spread. Output is ascending by date.
pub fn align_with_status(base: &Series, main: &Series, status_source: &Series) -> Vec<ComparisonPoint> {
    let status_map: HashMap<NaiveDate, (Option<Status>, Option<&String>)> = status_source
        .iter()
        .map(|p| (p.date, (p.status, p.status_reason.as_ref())))
        .collect();

    let decorate = |date: NaiveDate, value1: f64, value2: f64| {
        let (status, reason) = status_map.get(&date).copied().unwrap_or((None, None));
        ComparisonPoint {
            date,
            value1,
            value2,
            status,
            status_reason: reason.cloned(),
        }
    };

    // Hash the smaller leg, walk the larger one in order.
    if base.len() <= main.len() {
        let base_map: HashMap<NaiveDate, f64> = base.iter().map(|p| (p.date, p.value)).collect();
        main.iter()
            .filter_map(|m| base_map.get(&m.date).map(|&b| decorate(m.date, b, m.value)))
            .collect()
    } else {
        let main_map: HashMap<NaiveDate, f64> = main.iter().map(|p| (p.date, p.value)).collect();
        base.iter()
            .filter_map(|b| main_map.get(&b.date).map(|&m| decorate(b.date, b.value, m)))
            .collect()
    }
}
