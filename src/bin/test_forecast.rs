// src/bin/test_forecast.rs
use covid_forecast::models::SeriesType;
use covid_forecast::services::aggregate::align_tables;
use covid_forecast::services::forecast::forecast;
use covid_forecast::services::pipeline::fetch_tables;
use covid_forecast::Config;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let country = env::args().nth(1).unwrap_or_else(|| "US".to_string());
    let config = Config::from_env()?;
    let (confirmed, deaths, recovered) = fetch_tables(&config).await?;
    let series = align_tables(&confirmed, &deaths, &recovered)?;

    let row = series
        .iter()
        .find(|s| s.country == country)
        .ok_or_else(|| anyhow::anyhow!("country '{}' not found in sources", country))?;

    for kind in SeriesType::ALL {
        let result = forecast(&confirmed.axis.dates, row.series(kind), config.horizon)?;
        let dates = result.formatted_dates();
        println!(
            "{:<22} last observed {:>12.0}  {} -> {:>12.0}  {} -> {:>12.0}",
            kind.file_name(),
            row.series(kind).last().copied().unwrap_or_default(),
            dates.first().map(String::as_str).unwrap_or("-"),
            result.values.first().copied().unwrap_or_default(),
            dates.last().map(String::as_str).unwrap_or("-"),
            result.values.last().copied().unwrap_or_default(),
        );
    }
    Ok(())
}
