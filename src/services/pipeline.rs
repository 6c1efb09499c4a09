// src/services/pipeline.rs
use chrono::NaiveDate;
use log::{debug, info, warn};
use reqwest::Client;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::models::{CountryTable, ForecastSeries, SeriesType};
use crate::services::aggregate::{align_tables, parse_table};
use crate::services::fetch::fetch_source;
use crate::services::forecast::forecast;
use crate::services::store::{CountryExport, OutputStore, SeriesExport};

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub countries: usize,
    pub fits: usize,
    pub predicted_dates: Vec<String>,
}

/// The future date axis shared by every forecast of a run.
///
/// Every fit extends the same history axis, so all axes should be equal; a
/// differing axis fails the run instead of being written under the wrong dates.
#[derive(Debug, Default)]
pub struct PredictedAxis {
    dates: Option<Vec<NaiveDate>>,
}

impl PredictedAxis {
    /// Record the axis of one forecast. Returns `true` the first time, when
    /// the caller should persist it.
    pub fn observe(
        &mut self,
        forecast: &ForecastSeries,
        country: &str,
        kind: SeriesType,
    ) -> Result<bool> {
        if let Some(dates) = &self.dates {
            if *dates != forecast.dates {
                return Err(PipelineError::ForecastDateMismatch {
                    country: country.to_string(),
                    series: kind.to_string(),
                });
            }
            return Ok(false);
        }
        self.dates = Some(forecast.dates.clone());
        Ok(true)
    }
}

/// Fetch the three sources one after another and parse them.
pub async fn fetch_tables(config: &Config) -> Result<(CountryTable, CountryTable, CountryTable)> {
    let client = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let confirmed = parse_table(&fetch_source(&client, &config.sources.confirmed).await?)?;
    let deaths = parse_table(&fetch_source(&client, &config.sources.deaths).await?)?;
    let recovered = parse_table(&fetch_source(&client, &config.sources.recovered).await?)?;
    Ok((confirmed, deaths, recovered))
}

/// Run the whole batch: fetch, aggregate, derive, forecast, persist.
pub async fn run(config: &Config) -> Result<RunSummary> {
    info!("Starting run, writing to {}", config.data_dir.display());
    let (confirmed, deaths, recovered) = fetch_tables(config).await?;
    run_with_tables(&confirmed, &deaths, &recovered, config)
}

/// Everything after the fetch step, on already-parsed tables.
pub fn run_with_tables(
    confirmed: &CountryTable,
    deaths: &CountryTable,
    recovered: &CountryTable,
    config: &Config,
) -> Result<RunSummary> {
    let series = align_tables(confirmed, deaths, recovered)?;
    let axis = &confirmed.axis;

    let store = OutputStore::new(&config.data_dir);
    store.prepare_root()?;
    for country in &series {
        store.prepare_country(&country.country)?;
    }

    let mut shared_axis = PredictedAxis::default();
    let mut predicted_dates = Vec::new();
    let mut fits = 0;

    for country in &series {
        info!("Forecasting {}", country.country);
        let mut exports = Vec::new();

        for kind in SeriesType::ALL {
            let values = country.series(kind);
            store.write_series(&country.country, kind, values)?;

            let predicted = forecast(&axis.dates, values, config.horizon)?;
            fits += 1;
            store.write_forecast(&country.country, kind, &predicted.values)?;
            debug!(
                "{}/{}: {} observed, {} predicted",
                country.country,
                kind,
                values.len(),
                predicted.horizon()
            );

            if shared_axis.observe(&predicted, &country.country, kind)? {
                predicted_dates = predicted.formatted_dates();
                store.write_predicted_dates(&predicted_dates)?;
            }

            if config.export_json {
                exports.push(SeriesExport {
                    series: kind,
                    values: values.to_vec(),
                    predicted_dates: predicted.formatted_dates(),
                    predicted: predicted.values,
                });
            }
        }

        if config.export_json {
            store.write_country_json(&CountryExport {
                country: country.country.clone(),
                dates: axis.headers.clone(),
                series: exports,
            })?;
        }
    }

    if series.is_empty() {
        warn!("Sources contained no countries; predicted_dates was not written");
    }

    store.write_dates(&axis.headers)?;
    store.write_countries(confirmed.countries())?;

    info!(
        "Done: {} countries, {} model fits, output in {}",
        series.len(),
        fits,
        store.root().display()
    );
    Ok(RunSummary {
        countries: series.len(),
        fits,
        predicted_dates,
    })
}
