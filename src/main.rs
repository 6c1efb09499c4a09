use covid_forecast::config::DEFAULT_LOG_LEVEL;
use covid_forecast::fetch_data;
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // The logger has to be up before the config is read so its
    // defaults and overrides are reported. RUST_LOG wins when set.
    let level = env::var("COVID_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
    info!("Logger initialized. Starting the run...");

    if let Err(e) = fetch_data().await {
        error!("Run failed: {}", e);
        return Err(e.into());
    }
    Ok(())
}
