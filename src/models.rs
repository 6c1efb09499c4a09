// src/models.rs
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// The six per-country series, in the order they are processed and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesType {
    CumulativeTotal,
    CumulativeDeath,
    CumulativeRecovered,
    IncidentTotal,
    IncidentDeath,
    IncidentRecovered,
}

impl SeriesType {
    pub const ALL: [SeriesType; 6] = [
        SeriesType::CumulativeTotal,
        SeriesType::CumulativeDeath,
        SeriesType::CumulativeRecovered,
        SeriesType::IncidentTotal,
        SeriesType::IncidentDeath,
        SeriesType::IncidentRecovered,
    ];

    /// File name of the raw series inside a country directory.
    pub fn file_name(self) -> &'static str {
        match self {
            SeriesType::CumulativeTotal => "cumulative_total",
            SeriesType::CumulativeDeath => "cumulative_death",
            SeriesType::CumulativeRecovered => "cumulative_recovered",
            SeriesType::IncidentTotal => "incident_total",
            SeriesType::IncidentDeath => "incident_death",
            SeriesType::IncidentRecovered => "incident_recovered",
        }
    }

    pub fn predicted_file_name(self) -> String {
        format!("predicted_{}", self.file_name())
    }
}

impl fmt::Display for SeriesType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Dates shared by every country, with the header text they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DateAxis {
    pub headers: Vec<String>,
    pub dates: Vec<NaiveDate>,
}

impl DateAxis {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// One source CSV after sub-region rows were summed per country.
#[derive(Debug, Clone)]
pub struct CountryTable {
    pub axis: DateAxis,
    /// (country, values) in first-seen order.
    pub rows: Vec<(String, Vec<f64>)>,
}

impl CountryTable {
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, country: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .find(|(name, _)| name == country)
            .map(|(_, values)| values.as_slice())
    }
}

#[derive(Debug, Clone)]
pub struct CountrySeries {
    pub country: String,
    pub cumulative_total: Vec<f64>,
    pub cumulative_death: Vec<f64>,
    pub cumulative_recovered: Vec<f64>,
    pub incident_total: Vec<f64>,
    pub incident_death: Vec<f64>,
    pub incident_recovered: Vec<f64>,
}

impl CountrySeries {
    pub fn series(&self, kind: SeriesType) -> &[f64] {
        match kind {
            SeriesType::CumulativeTotal => &self.cumulative_total,
            SeriesType::CumulativeDeath => &self.cumulative_death,
            SeriesType::CumulativeRecovered => &self.cumulative_recovered,
            SeriesType::IncidentTotal => &self.incident_total,
            SeriesType::IncidentDeath => &self.incident_death,
            SeriesType::IncidentRecovered => &self.incident_recovered,
        }
    }
}

/// Future-only predictions for one country/series fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl ForecastSeries {
    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    /// Dates in the `MM/DD/YY` layout written to `predicted_dates`.
    pub fn formatted_dates(&self) -> Vec<String> {
        self.dates
            .iter()
            .map(|d| d.format("%m/%d/%y").to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_types_keep_fixed_order() {
        let names: Vec<_> = SeriesType::ALL.iter().map(|s| s.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "cumulative_total",
                "cumulative_death",
                "cumulative_recovered",
                "incident_total",
                "incident_death",
                "incident_recovered",
            ]
        );
        assert_eq!(
            SeriesType::IncidentDeath.predicted_file_name(),
            "predicted_incident_death"
        );
    }

    #[test]
    fn forecast_dates_are_zero_padded() {
        let forecast = ForecastSeries {
            dates: vec![NaiveDate::from_ymd_opt(2020, 3, 5).unwrap()],
            values: vec![1.0],
        };
        assert_eq!(forecast.formatted_dates(), vec!["03/05/20".to_string()]);
    }
}
