use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Alert status of a single observation. A missing status ("absent") is
/// modelled as `Option<Status>::None` and serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Alert,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Alert => "alert",
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Status::Normal),
            "alert" => Ok(Status::Alert),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
    pub status: Option<Status>,
    pub status_reason: Option<String>,
}

impl Observation {
    pub fn is_alert(&self) -> bool {
        self.status == Some(Status::Alert)
    }
}

/// Observations of one indicator, ascending by date with unique dates.
///
/// The only way in is [`Series::new`], which sorts and de-duplicates, so
/// everything downstream (stats, alert ranges, joins) can rely on order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series(Vec<Observation>);

impl Series {
    pub fn new(mut points: Vec<Observation>) -> Self {
        // Stable sort: for duplicate dates the row that came last wins.
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<Observation> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(prev) if prev.date == point.date => *prev = point,
                _ => deduped.push(point),
            }
        }
        Series(deduped)
    }

    pub fn empty() -> Self {
        Series(Vec::new())
    }

    pub fn points(&self) -> &[Observation] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Observation> {
        self.0
    }
}

impl From<Vec<Observation>> for Series {
    fn from(points: Vec<Observation>) -> Self {
        Series::new(points)
    }
}

/// Inclusive calendar-day range used for every store query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `days` back from `end`: start = end - days.
    pub fn last_days(end: NaiveDate, days: i64) -> Self {
        Self {
            start: end - Duration::days(days),
            end,
        }
    }
}

/// Inclusive run of consecutive alert days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlertRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Indicator {
    pub id: String,
    pub display_name: String,
    /// D = rates, C = credit, V = volatility
    pub factor: String,
    /// Core / Watch / Confirm
    pub tier: String,
    pub indicator_cn: String,
    pub indicator_en: String,
    pub source: String,
    pub series_id: String,
    pub frequency: String,
    pub rule_description: String,
    pub investment_implication: Option<String>,
    pub why_it_matter: Option<String>,
    pub url: Option<String>,
    pub source_url: Option<String>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Groups always present in the heatmap.
pub const HEATMAP_FACTORS: [&str; 3] = ["D", "C", "V"];
/// Groups always present in the indicator listing (`A` = auxiliary).
pub const LISTING_FACTORS: [&str; 4] = ["D", "C", "V", "A"];

/// Active indicators grouped by factor. The seeded groups are always
/// present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IndicatorsByFactor(BTreeMap<String, Vec<Indicator>>);

impl IndicatorsByFactor {
    /// Groups in input order, so a store ordered by (factor, tier) keeps
    /// tier order inside each group.
    pub fn group(indicators: impl IntoIterator<Item = Indicator>) -> Self {
        Self::group_seeded(&HEATMAP_FACTORS, indicators)
    }

    pub fn group_seeded(seed: &[&str], indicators: impl IntoIterator<Item = Indicator>) -> Self {
        let mut groups: BTreeMap<String, Vec<Indicator>> = seed
            .iter()
            .map(|f| (f.to_string(), Vec::new()))
            .collect();
        for indicator in indicators {
            groups.entry(indicator.factor.clone()).or_default().push(indicator);
        }
        IndicatorsByFactor(groups)
    }

    pub fn get(&self, factor: &str) -> &[Indicator] {
        self.0.get(factor).map(Vec::as_slice).unwrap_or(&[])
    }
}
