#[tokio::main]
async fn main() -> anyhow::Result<()> {
    risk_monitor_lib::run().await
}
