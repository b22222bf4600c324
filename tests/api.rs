use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use async_trait::async_trait;
use axum::Router;
use chrono::NaiveDate;
use risk_monitor_lib::api::{router, AppState};
use risk_monitor_lib::config::RangeDefaults;
use risk_monitor_lib::core::store::SeriesStore;
use risk_monitor_lib::db::{init_memory, save_observations, upsert_indicator, SqliteStore};
use risk_monitor_lib::error::{AppError, Result};
use risk_monitor_lib::indicators::registry::PairRegistry;
use risk_monitor_lib::models::{DateRange, Indicator, Observation, Series, Status};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

const VIX3M: &str = "yhfinance_^VIX3M";
const SPREAD: &str = "yhfinance_VIX-VIX3M";
// `^` percent-encoded for use in a URI
const VIX3M_QS: &str = "yhfinance_%5EVIX3M";

fn indicator(id: &str, factor: &str, tier: &str, active: bool) -> Indicator {
    Indicator {
        id: id.to_string(),
        display_name: id.to_string(),
        factor: factor.to_string(),
        tier: tier.to_string(),
        indicator_cn: String::new(),
        indicator_en: id.to_string(),
        source: "TEST".to_string(),
        series_id: id.to_string(),
        frequency: "Daily".to_string(),
        rule_description: "test rule".to_string(),
        investment_implication: None,
        why_it_matter: None,
        url: None,
        source_url: None,
        is_active: active,
        created_at: None,
        updated_at: None,
    }
}

fn obs(date: &str, value: f64, status: Option<Status>) -> Observation {
    Observation {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        value,
        status,
        status_reason: status.map(|s| format!("{} by rule", s.as_str())),
    }
}

async fn seeded_store() -> SqliteStore {
    let pool = init_memory().await.unwrap();

    upsert_indicator(&pool, &indicator("FRED_DFII10", "D", "Core", true)).await.unwrap();
    upsert_indicator(&pool, &indicator("FRED_BAMLH0A0HYM2", "C", "Watch", true)).await.unwrap();
    upsert_indicator(&pool, &indicator("RETIRED", "C", "Core", false)).await.unwrap();
    upsert_indicator(&pool, &indicator(VIX3M, "V", "Core", true)).await.unwrap();
    upsert_indicator(&pool, &indicator(SPREAD, "V", "Core", true)).await.unwrap();

    save_observations(&pool, "FRED_DFII10", &[
        obs("2024-01-01", 10.0, Some(Status::Normal)),
        obs("2024-01-02", 12.0, Some(Status::Alert)),
        obs("2024-01-03", 11.0, Some(Status::Alert)),
    ])
    .await
    .unwrap();
    save_observations(&pool, "RETIRED", &[obs("2024-01-02", 1.0, Some(Status::Alert))]).await.unwrap();

    save_observations(&pool, VIX3M, &[
        obs("2024-01-02", 15.0, None),
        obs("2024-01-03", 16.0, None),
        obs("2024-01-04", 17.0, None),
    ])
    .await
    .unwrap();
    // Highest-priority base candidate is empty; the second one has data.
    save_observations(&pool, "Wind_G0003892", &[
        obs("2024-01-03", 14.0, None),
        obs("2024-01-04", 18.0, None),
    ])
    .await
    .unwrap();
    save_observations(&pool, SPREAD, &[
        obs("2024-01-03", -2.0, Some(Status::Normal)),
        obs("2024-01-04", 1.0, Some(Status::Alert)),
    ])
    .await
    .unwrap();

    SqliteStore::new(pool)
}

fn app_over(store: Arc<dyn SeriesStore>) -> Router {
    let state = AppState::new(store, Arc::new(PairRegistry::builtin().unwrap()), RangeDefaults::default());
    router(state)
}

async fn app() -> Router {
    app_over(Arc::new(seeded_store().await))
}

/// Seeded store whose series reads fail for the listed ids.
struct FailingSeries {
    inner: SqliteStore,
    failing: HashSet<String>,
}

impl FailingSeries {
    async fn new(failing: &[&str]) -> Self {
        Self {
            inner: seeded_store().await,
            failing: failing.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl SeriesStore for FailingSeries {
    async fn fetch_series(&self, indicator_id: &str, range: &DateRange) -> Result<Series> {
        if self.failing.contains(indicator_id) {
            return Err(AppError::Upstream(format!("connection reset reading {}", indicator_id)));
        }
        self.inner.fetch_series(indicator_id, range).await
    }

    async fn fetch_window(&self, range: &DateRange) -> Result<Vec<(String, Observation)>> {
        self.inner.fetch_window(range).await
    }

    async fn active_indicator(&self, indicator_id: &str) -> Result<Option<Indicator>> {
        self.inner.active_indicator(indicator_id).await
    }

    async fn active_indicators(&self) -> Result<Vec<Indicator>> {
        self.inner.active_indicators().await
    }
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn single_indicator_stats_and_alert_ranges() {
    let (status, body) = get(
        app().await,
        "/api/data/FRED_DFII10?start_date=2024-01-01&end_date=2024-01-03",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["indicator"]["id"], "FRED_DFII10");
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"][0]["date"], "2024-01-01");

    let stats = &body["stats"];
    assert_eq!(stats["total_days"], 3);
    assert_eq!(stats["alert_days"], 2);
    assert_eq!(stats["alert_rate"], 66.7);
    assert_eq!(stats["latest_value"], 11.0);
    assert_eq!(stats["latest_status"], "alert");

    assert_eq!(
        body["alertRanges"],
        serde_json::json!([{"start": "2024-01-02", "end": "2024-01-03"}])
    );
}

#[tokio::test]
async fn single_indicator_max_points_keeps_full_stats() {
    let (status, body) = get(
        app().await,
        "/api/data/FRED_DFII10?start_date=2024-01-01&end_date=2024-01-03&max_points=2",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // ceil(3 / 2) = 2 -> indices 0 and 2
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][1]["date"], "2024-01-03");
    assert_eq!(body["stats"]["total_days"], 3);
}

#[tokio::test]
async fn inactive_or_unknown_indicator_is_404() {
    let (status, body) = get(app().await, "/api/data/RETIRED?days=30").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("RETIRED"));

    let (status, _) = get(app().await, "/api/data/NOPE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_parameters_are_400() {
    for uri in [
        "/api/data/FRED_DFII10?days=abc",
        "/api/data/FRED_DFII10?days=0",
        "/api/data/FRED_DFII10?start_date=2024-02-01&end_date=2024-01-01",
        "/api/data/FRED_DFII10?start_date=01/01/2024&end_date=2024-01-03",
        "/api/data/FRED_DFII10?max_points=0",
        "/api/heatmap?days=1000",
        "/api/heatmap?end_date=yesterday",
        "/api/heatmap?end_date=-262143-01-01&days=30",
        "/api/data/FRED_DFII10?start_date=-262143-01-01&end_date=2024-01-03",
    ] {
        let (status, body) = get(app().await, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn combined_requires_configured_pair() {
    let (status, body) = get(app().await, "/api/data/combined").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "main_indicator is required");

    let (status, _) = get(app().await, "/api/data/combined?main_indicator=FRED_DFII10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn combined_view_takes_status_from_spread() {
    let uri = format!(
        "/api/data/combined?main_indicator={}&start_date=2024-01-01&end_date=2024-01-31",
        VIX3M_QS
    );
    let (status, body) = get(app().await, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mainIndicator"]["id"], VIX3M);
    assert_eq!(body["baseSource"], "Wind_G0003892");
    assert_eq!(body["labels"]["line1"], "VIX");

    let rows = body["comparisonData"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["date"], "2024-01-03");
    assert_eq!(rows[0]["value1"], 14.0);
    assert_eq!(rows[0]["value2"], 16.0);
    assert_eq!(rows[0]["status"], "normal");
    assert_eq!(rows[1]["status"], "alert");

    assert_eq!(body["spreadData"].as_array().unwrap().len(), 2);
    assert_eq!(body["stats"]["alert_days"], 1);
    assert_eq!(body["stats"]["alert_rate"], 50.0);
    assert_eq!(body["alertRanges"][0]["start"], "2024-01-04");
}

#[tokio::test]
async fn combined_main_series_failure_is_500() {
    let app = app_over(Arc::new(FailingSeries::new(&[VIX3M]).await));
    let uri = format!(
        "/api/data/combined?main_indicator={}&start_date=2024-01-01&end_date=2024-01-31",
        SPREAD
    );
    let (status, body) = get(app, &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch data from store");
    assert!(body.get("comparisonData").is_none());
}

#[tokio::test]
async fn combined_spread_failure_degrades_to_empty() {
    let app = app_over(Arc::new(FailingSeries::new(&[SPREAD]).await));
    let uri = format!(
        "/api/data/combined?main_indicator={}&start_date=2024-01-01&end_date=2024-01-31",
        VIX3M_QS
    );
    let (status, body) = get(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["spreadData"], serde_json::json!([]));
    assert_eq!(body["stats"]["total_days"], 0);
    assert_eq!(body["stats"]["alert_rate"], 0.0);
    assert!(body["stats"]["latest_status"].is_null());
    assert_eq!(body["alertRanges"], serde_json::json!([]));

    // Base and main still join; status has nothing to borrow from.
    let rows = body["comparisonData"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["status"].is_null()));
}

#[tokio::test]
async fn combined_by_spread_id_uses_spread_metadata() {
    let uri = format!(
        "/api/data/combined?main_indicator={}&start_date=2024-01-01&end_date=2024-01-31",
        SPREAD
    );
    let (status, body) = get(app().await, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mainIndicator"]["id"], SPREAD);
    assert_eq!(body["comparisonData"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn heatmap_is_dense_and_hides_backing_indicators() {
    let (status, body) = get(app().await, "/api/heatmap?end_date=2024-01-04&days=4").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["dates"],
        serde_json::json!(["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"])
    );

    let map = body["statusMap"].as_object().unwrap();
    assert!(!map.contains_key(VIX3M));
    assert!(!map.contains_key("RETIRED"));
    assert!(map.contains_key(SPREAD));

    let row = &map["FRED_DFII10"];
    assert_eq!(row["2024-01-02"]["status"], "alert");
    assert!(row["2024-01-04"].is_null());

    let spread_row = &map[SPREAD];
    assert!(spread_row["2024-01-01"].is_null());
    assert_eq!(spread_row["2024-01-04"]["value"], 1.0);

    let v_ids: Vec<&str> = body["indicators"]["V"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(v_ids, vec![SPREAD]);
}

#[tokio::test]
async fn indicators_grouped_by_factor() {
    let (status, body) = get(app().await, "/api/indicators").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["D"].as_array().unwrap().len(), 1);
    assert_eq!(body["C"].as_array().unwrap().len(), 1);
    assert_eq!(body["V"].as_array().unwrap().len(), 2);
    assert_eq!(body["C"][0]["id"], "FRED_BAMLH0A0HYM2");
    assert!(body["A"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health() {
    let (status, body) = get(app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
