// src/services/incident.rs
use crate::error::{PipelineError, Result};

/// Day-over-day changes of a cumulative series.
///
/// The first element is copied from the input, not differenced. Downward
/// revisions in the source show up as negative values and are kept.
pub fn derive_incident(cumulative: &[f64]) -> Result<Vec<f64>> {
    let first = *cumulative.first().ok_or_else(|| {
        PipelineError::EmptySeries(
            "cannot derive incident counts from a zero-length cumulative series".to_string(),
        )
    })?;

    let mut incident = Vec::with_capacity(cumulative.len());
    incident.push(first);
    incident.extend(cumulative.windows(2).map(|pair| pair[1] - pair[0]));
    Ok(incident)
}
