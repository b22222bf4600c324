use risk_monitor_lib::config::AppConfig;
use risk_monitor_lib::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env();
    println!("Connecting to: {}", cfg.database_url);

    let pool = db::init(&cfg.database_url, 1).await?;
    let rows = db::get_inventory(&pool).await?;

    println!(
        "{:<28} | {:<6} | {:<6} | {:<8} | {:<8} | {:<12} | {:<12}",
        "Indicator", "Factor", "Active", "Count", "Alerts", "First", "Last"
    );
    println!("{}", "-".repeat(100));

    for row in &rows {
        let active = match row.is_active {
            Some(true) => "yes",
            Some(false) => "no",
            None => "?",
        };
        println!(
            "{:<28} | {:<6} | {:<6} | {:<8} | {:<8} | {:<12} | {:<12}",
            row.id,
            row.factor.as_deref().unwrap_or("-"),
            active,
            row.total_rows,
            row.alert_rows,
            row.first_date.as_deref().unwrap_or("-"),
            row.last_date.as_deref().unwrap_or("-"),
        );
    }

    println!("\n{} indicators with data.", rows.len());
    Ok(())
}
