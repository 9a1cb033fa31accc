#[tokio::main]
async fn main() -> anyhow::Result<()> {
    forecast_lib::run().await
}
