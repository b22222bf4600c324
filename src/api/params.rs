use crate::error::{AppError, Result};
use crate::models::DateRange;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

pub const MAX_SERIES_DAYS: i64 = 3650;
pub const MAX_HEATMAP_DAYS: i64 = 366;

// ── Query params ─────────────────────────────────────────────────────────
//
// Everything arrives as text so malformed values surface as our own 400
// payload instead of axum's plain-text rejection.

#[derive(Debug, Default, Deserialize)]
pub struct SeriesQuery {
    pub days: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub max_points: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CombinedQuery {
    pub main_indicator: Option<String>,
    pub days: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub max_points: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HeatmapQuery {
    pub end_date: Option<String>,
    pub days: Option<String>,
}

// ── Parsing ──────────────────────────────────────────────────────────────

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

pub fn parse_date(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match present(raw) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .filter(|d| (1..=9999).contains(&d.year()))
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("{} must be YYYY-MM-DD, got '{}'", name, s))),
    }
}

/// Positive day count, `default` when omitted.
pub fn parse_days(raw: Option<&str>, default: i64, max: i64) -> Result<i64> {
    let Some(s) = present(raw) else {
        return Ok(default);
    };
    let days: i64 = s
        .parse()
        .map_err(|_| AppError::Validation(format!("days must be a positive integer, got '{}'", s)))?;
    if days <= 0 {
        return Err(AppError::Validation(format!("days must be a positive integer, got '{}'", s)));
    }
    if days > max {
        return Err(AppError::Validation(format!("days must not exceed {}", max)));
    }
    Ok(days)
}

pub fn parse_max_points(raw: Option<&str>) -> Result<Option<usize>> {
    match present(raw) {
        None => Ok(None),
        Some(s) => match s.parse::<usize>() {
            Ok(0) | Err(_) => Err(AppError::Validation(format!(
                "max_points must be a positive integer, got '{}'",
                s
            ))),
            Ok(n) => Ok(Some(n)),
        },
    }
}

/// Explicit `[start_date, end_date]` when both are given, otherwise the last
/// `days` days up to `today`. Any supplied value is validated.
pub fn resolve_range(
    days: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    default_days: i64,
    today: NaiveDate,
) -> Result<DateRange> {
    let days = parse_days(days, default_days, MAX_SERIES_DAYS)?;
    let start = parse_date("start_date", start_date)?;
    let end = parse_date("end_date", end_date)?;

    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(AppError::Validation(format!(
            "start_date {} is after end_date {}",
            start, end
        ))),
        (Some(start), Some(end)) => Ok(DateRange::new(start, end)),
        _ => Ok(DateRange::last_days(today, days)),
    }
}

impl SeriesQuery {
    pub fn range(&self, default_days: i64, today: NaiveDate) -> Result<DateRange> {
        resolve_range(
            self.days.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            default_days,
            today,
        )
    }
}

impl CombinedQuery {
    pub fn range(&self, default_days: i64, today: NaiveDate) -> Result<DateRange> {
        resolve_range(
            self.days.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            default_days,
            today,
        )
    }

    pub fn main_indicator(&self) -> Result<&str> {
        present(self.main_indicator.as_deref())
            .ok_or_else(|| AppError::Validation("main_indicator is required".to_string()))
    }
}

impl HeatmapQuery {
    /// End date and window length of the grid.
    pub fn window(&self, default_days: i64, today: NaiveDate) -> Result<(NaiveDate, usize)> {
        let end = parse_date("end_date", self.end_date.as_deref())?.unwrap_or(today);
        let days = parse_days(self.days.as_deref(), default_days, MAX_HEATMAP_DAYS)?;
        Ok((end, days as usize))
    }
}
