use crate::core::store::SeriesStore;
use crate::models::{DateRange, Series};
use tracing::{debug, warn};

/// Outcome of a priority-ordered source lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSource {
    /// Candidate that supplied the data, `None` when every candidate was empty.
    pub indicator_id: Option<String>,
    pub series: Series,
}

/// Tries `candidates` in order and returns the first non-empty series.
///
/// Lookups run one after another and stop at the first hit, so the winner is
/// always the highest-priority candidate with data. A failing lookup is
/// logged and skipped. No data at all yields an empty series, not an error.
pub async fn resolve_first_available(
    store: &dyn SeriesStore,
    candidates: &[String],
    range: &DateRange,
) -> ResolvedSource {
    for candidate in candidates {
        match store.fetch_series(candidate, range).await {
            Ok(series) if !series.is_empty() => {
                debug!("Source resolved to '{}' ({} points)", candidate, series.len());
                return ResolvedSource {
                    indicator_id: Some(candidate.clone()),
                    series,
                };
            }
            Ok(_) => debug!("Candidate '{}' has no data in range", candidate),
            Err(e) => warn!("Candidate '{}' lookup failed: {}", candidate, e),
        }
    }

    ResolvedSource::default()
}
