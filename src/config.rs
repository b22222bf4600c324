use std::env;
use std::path::PathBuf;

/// Service configuration read from the environment (`.env` is loaded first).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub defaults: RangeDefaults,
    /// JSON file overriding the built-in combined pair registry.
    pub pair_registry_file: Option<PathBuf>,
}

/// Default look-back windows (days) per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeDefaults {
    pub series_days: i64,
    pub combined_days: i64,
    pub heatmap_days: i64,
}

impl Default for RangeDefaults {
    fn default() -> Self {
        Self {
            series_days: 30,
            combined_days: 730,
            heatmap_days: 30,
        }
    }
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .filter(|v: &i64| *v > 0)
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .filter(|v: &u32| *v > 0)
        .unwrap_or(default)
}

fn env_opt_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

impl AppConfig {
    pub fn from_env() -> Self {
        // Missing .env is fine; real environment wins either way.
        let _ = dotenvy::dotenv();

        let fallback = RangeDefaults::default();
        Self {
            database_url: env_str("DATABASE_URL", "sqlite://data/indicators.db?mode=rwc"),
            bind_addr: env_str("BIND_ADDR", "127.0.0.1:8080"),
            db_max_connections: env_u32("DB_MAX_CONNECTIONS", 5),
            defaults: RangeDefaults {
                series_days: env_i64("SERIES_DEFAULT_DAYS", fallback.series_days),
                combined_days: env_i64("COMBINED_DEFAULT_DAYS", fallback.combined_days),
                heatmap_days: env_i64("HEATMAP_DEFAULT_DAYS", fallback.heatmap_days),
            },
            pair_registry_file: env_opt_path("PAIR_REGISTRY_FILE"),
        }
    }
}
