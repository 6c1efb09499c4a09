// src/lib.rs

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use services::incident::derive_incident;
pub use services::pipeline::{run, run_with_tables, RunSummary};

/// Run the full pipeline with configuration taken from the environment.
pub async fn fetch_data() -> Result<()> {
    let config = Config::from_env()?;
    run(&config).await?;
    Ok(())
}
