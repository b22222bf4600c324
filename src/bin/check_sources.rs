use chrono::{NaiveDate, Utc};
use risk_monitor_lib::config::AppConfig;
use risk_monitor_lib::core::resolver::resolve_first_available;
use risk_monitor_lib::core::store::SeriesStore;
use risk_monitor_lib::db::{self, SqliteStore};
use risk_monitor_lib::indicators::registry::PairRegistry;
use risk_monitor_lib::models::{DateRange, Series};
use std::collections::BTreeSet;

const DEFAULT_WINDOW_DAYS: i64 = 730;
const MAX_LISTED_DATES: usize = 10;

fn span(series: &Series) -> (String, String) {
    let fmt = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
    (fmt(series.first().map(|p| p.date)), fmt(series.last().map(|p| p.date)))
}

fn list_dates(label: &str, dates: &BTreeSet<NaiveDate>) {
    let shown: Vec<String> = dates.iter().take(MAX_LISTED_DATES).map(|d| d.to_string()).collect();
    let more = dates.len().saturating_sub(MAX_LISTED_DATES);
    if more > 0 {
        println!("    {:<18} {} [{} ...+{}]", label, dates.len(), shown.join(", "), more);
    } else {
        println!("    {:<18} {} [{}]", label, dates.len(), shown.join(", "));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env();
    let days = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|d| *d > 0)
        .unwrap_or(DEFAULT_WINDOW_DAYS);

    println!("Connecting to: {}", cfg.database_url);
    let pool = db::init(&cfg.database_url, 1).await?;
    let store = SqliteStore::new(pool);
    let registry = PairRegistry::load(cfg.pair_registry_file.as_deref())?;
    let range = DateRange::last_days(Utc::now().date_naive(), days);

    println!("Window: {} .. {} ({} days)\n", range.start, range.end, days);

    for pair in registry.pairs() {
        println!("== {} (main: {}, spread: {})", pair.pair_id, pair.main_indicator_id, pair.spread_indicator_id);
        println!("  {:<24} | {:<8} | {:<12} | {:<12}", "Candidate", "Count", "First", "Last");
        println!("  {}", "-".repeat(64));

        for candidate in &pair.base_candidate_ids {
            match store.fetch_series(candidate, &range).await {
                Ok(series) => {
                    let (first, last) = span(&series);
                    println!("  {:<24} | {:<8} | {:<12} | {:<12}", candidate, series.len(), first, last);
                }
                Err(e) => println!("  {:<24} | ERROR: {}", candidate, e),
            }
        }

        let resolved = resolve_first_available(&store, &pair.base_candidate_ids, &range).await;
        println!(
            "  Selected base: {}",
            resolved.indicator_id.as_deref().unwrap_or("<none>")
        );

        let main = match store.fetch_series(&pair.main_indicator_id, &range).await {
            Ok(series) => series,
            Err(e) => {
                println!("  Main series failed: {}\n", e);
                continue;
            }
        };

        let base_dates: BTreeSet<NaiveDate> = resolved.series.iter().map(|p| p.date).collect();
        let main_dates: BTreeSet<NaiveDate> = main.iter().map(|p| p.date).collect();

        println!("  Intersection: {} dates", base_dates.intersection(&main_dates).count());
        list_dates("main without base", &main_dates.difference(&base_dates).copied().collect());
        list_dates("base without main", &base_dates.difference(&main_dates).copied().collect());
        println!();
    }

    println!("Done.");
    Ok(())
}
