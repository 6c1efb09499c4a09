// src/config.rs
use dotenv::dotenv;
use log::{debug, warn};
use std::env;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};

pub const DEFAULT_CONFIRMED_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_confirmed_global.csv";
pub const DEFAULT_DEATHS_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_deaths_global.csv";
pub const DEFAULT_RECOVERED_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_recovered_global.csv";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_HORIZON: usize = 60;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Where each dataset comes from: an http(s) URL or a local file path.
#[derive(Debug, Clone)]
pub struct Sources {
    pub confirmed: String,
    pub deaths: String,
    pub recovered: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sources: Sources,
    pub data_dir: PathBuf,
    pub horizon: usize,
    pub export_json: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sources: Sources {
                confirmed: DEFAULT_CONFIRMED_URL.to_string(),
                deaths: DEFAULT_DEATHS_URL.to_string(),
                recovered: DEFAULT_RECOVERED_URL.to_string(),
            },
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            horizon: DEFAULT_HORIZON,
            export_json: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Read the configuration from the environment, loading `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let text = |key: &str, default: String| -> Result<String> {
            match lookup(key) {
                Some(value) if value.trim().is_empty() => {
                    Err(PipelineError::Config(format!("{} is set but empty", key)))
                }
                Some(value) => Ok(value.trim().to_string()),
                None => {
                    debug!("{} not set, defaulting to {}", key, default);
                    Ok(default)
                }
            }
        };

        let sources = Sources {
            confirmed: text("COVID_CONFIRMED_URL", defaults.sources.confirmed)?,
            deaths: text("COVID_DEATHS_URL", defaults.sources.deaths)?,
            recovered: text("COVID_RECOVERED_URL", defaults.sources.recovered)?,
        };

        let data_dir = PathBuf::from(text(
            "COVID_DATA_DIR",
            defaults.data_dir.to_string_lossy().into_owned(),
        )?);

        let horizon_str = text("COVID_FORECAST_HORIZON", defaults.horizon.to_string())?;
        let horizon: usize = horizon_str.parse().map_err(|_| {
            PipelineError::Config(format!(
                "COVID_FORECAST_HORIZON must be a positive integer, got '{}'",
                horizon_str
            ))
        })?;
        if horizon == 0 {
            return Err(PipelineError::Config(
                "COVID_FORECAST_HORIZON must be at least 1".to_string(),
            ));
        }

        let export_str = text("COVID_EXPORT_JSON", defaults.export_json.to_string())?;
        let export_json = match export_str.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => {
                return Err(PipelineError::Config(format!(
                    "COVID_EXPORT_JSON must be a boolean, got '{}'",
                    other
                )))
            }
        };

        let log_level = text("COVID_LOG_LEVEL", defaults.log_level)?;

        if horizon != DEFAULT_HORIZON {
            warn!("Forecast horizon overridden to {} days", horizon);
        }

        Ok(Config {
            sources,
            data_dir,
            horizon,
            export_json,
            log_level,
        })
    }
}
