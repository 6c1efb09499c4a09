// src/error.rs
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every failure aborts the whole run; nothing here is recovered locally.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing or invalid configuration, or a source that yielded nothing.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Source CSV is missing expected columns or holds unparsable cells.
    #[error("malformed source: {0}")]
    MalformedSource(String),

    #[error("empty series passed to incident derivation: {0}")]
    EmptySeries(String),

    /// The three source tables disagree on dates or countries.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("model fit failed: {0}")]
    ModelFit(String),

    #[error("forecast dates for {country}/{series} differ from the shared predicted_dates axis")]
    ForecastDateMismatch { country: String, series: String },
}
