use anyhow::Result;
use nonnobot::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the log filter so RUST_LOG set there takes effect.
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,teloxide=warn,reqwest=warn".parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    cli::run().await
}
