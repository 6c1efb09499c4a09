// src/services/store.rs
use log::{debug, info};
use serde::Serialize;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::models::SeriesType;

/// Format a value the way the downstream readers expect:
/// `d.dddddddddddddddddde+XX`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let raw = format!("{:.18e}", value);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => raw,
    }
}

/// One series of one country, as exported to JSON.
#[derive(Debug, Serialize)]
pub struct SeriesExport {
    pub series: SeriesType,
    pub values: Vec<f64>,
    pub predicted: Vec<f64>,
    pub predicted_dates: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CountryExport {
    pub country: String,
    pub dates: Vec<String>,
    pub series: Vec<SeriesExport>,
}

/// The output directory tree rooted at the configured base directory.
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OutputStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prepare_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        info!("Output directory ready: {}", self.root.display());
        Ok(())
    }

    /// Create (if needed) and return the directory for `country`.
    pub fn prepare_country(&self, country: &str) -> Result<PathBuf> {
        let dir = self.country_dir(country)?;
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn country_dir(&self, country: &str) -> Result<PathBuf> {
        if country.is_empty()
            || country == "."
            || country == ".."
            || country.contains('/')
            || country.contains('\\')
        {
            return Err(PipelineError::MalformedSource(format!(
                "country name '{}' cannot be used as a directory",
                country
            )));
        }
        Ok(self.root.join(country))
    }

    pub fn write_series(&self, country: &str, kind: SeriesType, values: &[f64]) -> Result<()> {
        let path = self.country_dir(country)?.join(kind.file_name());
        write_lines(&path, values.iter().map(|v| format_value(*v)))
    }

    pub fn write_forecast(&self, country: &str, kind: SeriesType, values: &[f64]) -> Result<()> {
        let path = self.country_dir(country)?.join(kind.predicted_file_name());
        write_lines(&path, values.iter().map(|v| format_value(*v)))
    }

    pub fn write_dates(&self, headers: &[String]) -> Result<()> {
        write_lines(&self.root.join("dates"), headers)
    }

    pub fn write_countries<'a>(&self, countries: impl IntoIterator<Item = &'a str>) -> Result<()> {
        write_lines(&self.root.join("countries"), countries)
    }

    pub fn write_predicted_dates(&self, dates: &[String]) -> Result<()> {
        write_lines(&self.root.join("predicted_dates"), dates)
    }

    pub fn write_country_json(&self, export: &CountryExport) -> Result<()> {
        let path = self.country_dir(&export.country)?.join("forecast.json");
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, export)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Write one item per line; the file is closed when the writer drops,
/// including on the error paths.
pub fn write_lines<I, T>(path: &Path, items: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        writeln!(writer, "{}", item)?;
    }
    writer.flush()?;
    debug!("Wrote {}", path.display());
    Ok(())
}
