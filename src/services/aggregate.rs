// src/services/aggregate.rs
use chrono::NaiveDate;
use csv::Reader;
use log::{debug, info};
use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::models::{CountrySeries, CountryTable, DateAxis};
use crate::services::incident::derive_incident;

const PROVINCE: &str = "Province/State";
const COUNTRY: &str = "Country/Region";
const LAT: &str = "Lat";
const LONG: &str = "Long";

/// Parse an `M/D/YY` column header.
pub fn parse_date_header(header: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(header.trim(), "%m/%d/%y").map_err(|e| {
        PipelineError::MalformedSource(format!("bad date header '{}': {}", header, e))
    })
}

/// Parse one source CSV and sum its rows per country.
pub fn parse_table(csv_text: &str) -> Result<CountryTable> {
    let mut rdr = Reader::from_reader(csv_text.as_bytes());
    let headers = rdr.headers()?.clone();

    let position = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| PipelineError::MalformedSource(format!("no '{}' column", name)))
    };

    let idx_province = position(PROVINCE)?;
    let idx_country = position(COUNTRY)?;
    let idx_lat = position(LAT)?;
    let idx_long = position(LONG)?;

    // Everything that is not a geographic column is a date column.
    let date_columns: Vec<usize> = (0..headers.len())
        .filter(|i| ![idx_province, idx_country, idx_lat, idx_long].contains(i))
        .collect();
    if date_columns.is_empty() {
        return Err(PipelineError::MalformedSource(
            "no date columns in source".to_string(),
        ));
    }

    let mut axis = DateAxis {
        headers: Vec::with_capacity(date_columns.len()),
        dates: Vec::with_capacity(date_columns.len()),
    };
    for &i in &date_columns {
        let header = headers[i].trim().to_string();
        axis.dates.push(parse_date_header(&header)?);
        axis.headers.push(header);
    }

    let mut rows: Vec<(String, Vec<f64>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (line, record) in rdr.records().enumerate() {
        let row = record?;
        let country = row
            .get(idx_country)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                PipelineError::MalformedSource(format!("row {} has no country", line + 1))
            })?
            .to_string();

        let slot = match index.get(&country) {
            Some(&slot) => slot,
            None => {
                index.insert(country.clone(), rows.len());
                rows.push((country.clone(), vec![0.0; date_columns.len()]));
                rows.len() - 1
            }
        };

        let totals = &mut rows[slot].1;
        for (total, &col) in totals.iter_mut().zip(&date_columns) {
            *total += parse_cell(row.get(col).unwrap_or(""), &country, &headers[col])?;
        }
    }

    info!(
        "Aggregated source into {} countries over {} dates",
        rows.len(),
        axis.len()
    );
    Ok(CountryTable { axis, rows })
}

// Blank cells count as zero, like a NaN-skipping sum.
fn parse_cell(cell: &str, country: &str, header: &str) -> Result<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        debug!("Blank cell for {} on {}, counting as 0", country, header);
        return Ok(0.0);
    }
    cell.parse::<f64>().map_err(|_| {
        PipelineError::MalformedSource(format!(
            "non-numeric value '{}' for {} on {}",
            cell, country, header
        ))
    })
}

/// Join the three aggregated tables into per-country series.
pub fn align_tables(
    confirmed: &CountryTable,
    deaths: &CountryTable,
    recovered: &CountryTable,
) -> Result<Vec<CountrySeries>> {
    for (name, table) in [("deaths", deaths), ("recovered", recovered)] {
        if table.axis.dates != confirmed.axis.dates {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} table has {} dates, confirmed has {} (or they differ)",
                name,
                table.axis.len(),
                confirmed.axis.len()
            )));
        }
    }

    confirmed
        .rows
        .iter()
        .map(|(country, cumulative_total)| {
            let lookup = |name: &str, table: &CountryTable| -> Result<Vec<f64>> {
                table.get(country).map(<[f64]>::to_vec).ok_or_else(|| {
                    PipelineError::ShapeMismatch(format!(
                        "country '{}' missing from {} table",
                        country, name
                    ))
                })
            };
            let cumulative_death = lookup("deaths", deaths)?;
            let cumulative_recovered = lookup("recovered", recovered)?;

            Ok(CountrySeries {
                country: country.clone(),
                incident_total: derive_incident(cumulative_total)?,
                incident_death: derive_incident(&cumulative_death)?,
                incident_recovered: derive_incident(&cumulative_recovered)?,
                cumulative_total: cumulative_total.clone(),
                cumulative_death,
                cumulative_recovered,
            })
        })
        .collect()
}
