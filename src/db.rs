use crate::core::store::SeriesStore;
use crate::error::Result;
use crate::models::{DateRange, Indicator, Observation, Series, Status};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

pub async fn init(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    info!("Connecting to SQLite database: {}", database_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database initialized successfully.");
    Ok(pool)
}

/// Single-connection in-memory database with the schema applied.
/// The connection never idles out, otherwise the data would vanish.
pub async fn init_memory() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

const INDICATOR_COLUMNS: &str = r#"
    id, display_name, factor, tier, indicator_cn, indicator_en, source, series_id,
    frequency, rule_description, investment_implication, why_it_matter, url, source_url,
    is_active, created_at, updated_at
"#;

/// Raw `indicator_data` row as stored; status is free text in the table.
#[derive(Debug, FromRow)]
struct ObservationRow {
    date: NaiveDate,
    value: f64,
    status: Option<String>,
    status_reason: Option<String>,
}

#[derive(Debug, FromRow)]
struct WindowRow {
    indicator_id: String,
    date: NaiveDate,
    value: f64,
    status: Option<String>,
    status_reason: Option<String>,
}

fn parse_status(raw: Option<String>, indicator_id: &str, date: NaiveDate) -> Option<Status> {
    let raw = raw?;
    match raw.parse::<Status>() {
        Ok(status) => Some(status),
        Err(e) => {
            debug!("{} @ {}: {}, treating as absent", indicator_id, date, e);
            None
        }
    }
}

impl ObservationRow {
    fn into_observation(self, indicator_id: &str) -> Observation {
        let status = parse_status(self.status, indicator_id, self.date);
        Observation {
            date: self.date,
            value: self.value,
            status,
            status_reason: self.status_reason,
        }
    }
}

impl WindowRow {
    fn into_pair(self) -> (String, Observation) {
        let status = parse_status(self.status, &self.indicator_id, self.date);
        let observation = Observation {
            date: self.date,
            value: self.value,
            status,
            status_reason: self.status_reason,
        };
        (self.indicator_id, observation)
    }
}

/// [`SeriesStore`] backed by the SQLite schema in `migrations/`.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeriesStore for SqliteStore {
    async fn fetch_series(&self, indicator_id: &str, range: &DateRange) -> Result<Series> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT date, value, status, status_reason
            FROM indicator_data
            WHERE indicator_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date ASC
            "#,
        )
        .bind(indicator_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        let points = rows
            .into_iter()
            .map(|row| row.into_observation(indicator_id))
            .collect();
        Ok(Series::new(points))
    }

    async fn fetch_window(&self, range: &DateRange) -> Result<Vec<(String, Observation)>> {
        let rows = sqlx::query_as::<_, WindowRow>(
            r#"
            SELECT indicator_id, date, value, status, status_reason
            FROM indicator_data
            WHERE date >= $1 AND date <= $2
            ORDER BY date ASC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WindowRow::into_pair).collect())
    }

    async fn active_indicator(&self, indicator_id: &str) -> Result<Option<Indicator>> {
        let query = format!(
            "SELECT {} FROM indicators WHERE id = $1 AND is_active = 1",
            INDICATOR_COLUMNS
        );
        let indicator = sqlx::query_as::<_, Indicator>(&query)
            .bind(indicator_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(indicator)
    }

    async fn active_indicators(&self) -> Result<Vec<Indicator>> {
        let query = format!(
            "SELECT {} FROM indicators WHERE is_active = 1 ORDER BY factor, tier",
            INDICATOR_COLUMNS
        );
        let indicators = sqlx::query_as::<_, Indicator>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(indicators)
    }
}

// =====================================================================
// FIXTURE / DIAGNOSTIC WRITES (never used on a request path)
// =====================================================================

pub async fn upsert_indicator(pool: &SqlitePool, indicator: &Indicator) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO indicators (
            id, display_name, factor, tier, indicator_cn, indicator_en, source, series_id,
            frequency, rule_description, investment_implication, why_it_matter, url, source_url,
            is_active
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (id) DO UPDATE
        SET display_name = EXCLUDED.display_name,
            factor = EXCLUDED.factor,
            tier = EXCLUDED.tier,
            indicator_cn = EXCLUDED.indicator_cn,
            indicator_en = EXCLUDED.indicator_en,
            source = EXCLUDED.source,
            series_id = EXCLUDED.series_id,
            frequency = EXCLUDED.frequency,
            rule_description = EXCLUDED.rule_description,
            investment_implication = EXCLUDED.investment_implication,
            why_it_matter = EXCLUDED.why_it_matter,
            url = EXCLUDED.url,
            source_url = EXCLUDED.source_url,
            is_active = EXCLUDED.is_active,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&indicator.id)
    .bind(&indicator.display_name)
    .bind(&indicator.factor)
    .bind(&indicator.tier)
    .bind(&indicator.indicator_cn)
    .bind(&indicator.indicator_en)
    .bind(&indicator.source)
    .bind(&indicator.series_id)
    .bind(&indicator.frequency)
    .bind(&indicator.rule_description)
    .bind(&indicator.investment_implication)
    .bind(&indicator.why_it_matter)
    .bind(&indicator.url)
    .bind(&indicator.source_url)
    .bind(indicator.is_active)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn save_observations(
    pool: &SqlitePool,
    indicator_id: &str,
    points: &[Observation],
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    for point in points {
        sqlx::query(
            "INSERT INTO indicator_data (indicator_id, date, value, status, status_reason)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (indicator_id, date) DO UPDATE
             SET value = EXCLUDED.value,
                 status = EXCLUDED.status,
                 status_reason = EXCLUDED.status_reason",
        )
        .bind(indicator_id)
        .bind(point.date)
        .bind(point.value)
        .bind(point.status.map(|s| s.as_str()))
        .bind(&point.status_reason)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Per-indicator inventory row for the `inspect_db` diagnostic.
#[derive(Debug, FromRow)]
pub struct InventoryRow {
    pub id: String,
    pub factor: Option<String>,
    pub is_active: Option<bool>,
    pub total_rows: i64,
    pub alert_rows: i64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

pub async fn get_inventory(pool: &SqlitePool) -> anyhow::Result<Vec<InventoryRow>> {
    // Data rows whose indicator has no metadata still show up (factor NULL).
    let rows = sqlx::query_as::<_, InventoryRow>(
        r#"
        SELECT
            d.indicator_id AS id,
            i.factor AS factor,
            i.is_active AS is_active,
            COUNT(*) AS total_rows,
            SUM(CASE WHEN d.status = 'alert' THEN 1 ELSE 0 END) AS alert_rows,
            MIN(d.date) AS first_date,
            MAX(d.date) AS last_date
        FROM indicator_data d
        LEFT JOIN indicators i ON i.id = d.indicator_id
        GROUP BY d.indicator_id
        ORDER BY i.factor, d.indicator_id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
