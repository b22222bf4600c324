use crate::error::Result;
use crate::models::{DateRange, Indicator, Observation, Series};
use async_trait::async_trait;

/// Read-only access to indicator metadata and daily observations.
///
/// Implementations map their raw rows into typed records before returning;
/// nothing untyped crosses this boundary.
#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// Observations of one indicator inside `range`, ascending by date.
    async fn fetch_series(&self, indicator_id: &str, range: &DateRange) -> Result<Series>;

    /// Every observation of every indicator inside `range`, in one query.
    async fn fetch_window(&self, range: &DateRange) -> Result<Vec<(String, Observation)>>;

    /// Metadata for `indicator_id` if it exists and is active.
    async fn active_indicator(&self, indicator_id: &str) -> Result<Option<Indicator>>;

    /// All active indicators ordered by factor, then tier.
    async fn active_indicators(&self) -> Result<Vec<Indicator>>;
}
