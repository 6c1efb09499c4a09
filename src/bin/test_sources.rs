// src/bin/test_sources.rs
use covid_forecast::services::pipeline::fetch_tables;
use covid_forecast::Config;
use dotenv::dotenv;
use log::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    info!("Checking the three configured sources...");
    let (confirmed, deaths, recovered) = fetch_tables(&config).await?;

    for (name, table) in [
        ("confirmed", &confirmed),
        ("deaths", &deaths),
        ("recovered", &recovered),
    ] {
        println!(
            "{:<10} {:>4} countries, {:>4} dates ({} .. {})",
            name,
            table.rows.len(),
            table.axis.len(),
            table.axis.headers.first().map(String::as_str).unwrap_or("-"),
            table.axis.headers.last().map(String::as_str).unwrap_or("-"),
        );
    }
    Ok(())
}
