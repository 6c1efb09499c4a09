// src/services/forecast.rs
//! Additive trend + seasonality forecasting.
//!
//! The model is `y(t) = g(t) + s(t)` where `g` is a piecewise-linear trend
//! with automatically placed changepoints and `s` is a sum of Fourier terms
//! for weekly and yearly cycles. Coefficients are the MAP estimate under
//! Gaussian priors, which reduces to one penalised least-squares solve.

use chrono::{Duration, NaiveDate};
use log::debug;
use std::f64::consts::PI;

use crate::error::{PipelineError, Result};
use crate::models::ForecastSeries;
use crate::services::ols::ridge_fit;

/// Common interface for forecasting models.
pub trait Forecaster {
    /// Fit the model to dated observations.
    fn fit(&mut self, dates: &[NaiveDate], values: &[f64]) -> Result<()>;

    /// Predict the mean for arbitrary dates.
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<f64>>;

    fn name(&self) -> &str;

    fn is_fitted(&self) -> bool;
}

// Observation noise variance (in scaled units) assumed by the priors.
const NOISE_VARIANCE: f64 = 0.01;
const UNPENALISED: f64 = 1e-8;

#[derive(Debug, Clone)]
struct FittedState {
    start: NaiveDate,
    span_days: f64,
    scale: f64,
    changepoints: Vec<f64>,
    weekly_order: usize,
    yearly_order: usize,
    coefficients: Vec<f64>,
}

/// Piecewise-linear trend plus Fourier seasonality, fit with default priors.
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    n_changepoints: usize,
    changepoint_range: f64,
    changepoint_prior_scale: f64,
    seasonality_prior_scale: f64,
    weekly_order: usize,
    yearly_order: usize,
    state: Option<FittedState>,
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            weekly_order: 3,
            yearly_order: 10,
            state: None,
        }
    }
}

impl AdditiveModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changepoint locations (in normalised time) of the fitted model.
    pub fn changepoints(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.changepoints.as_slice())
    }

    /// Weekly and yearly Fourier orders the fit actually used.
    pub fn seasonal_orders(&self) -> Option<(usize, usize)> {
        self.state.as_ref().map(|s| (s.weekly_order, s.yearly_order))
    }

    /// Candidate changepoints are spread evenly over the first
    /// `changepoint_range` share of the history.
    fn place_changepoints(&self, t: &[f64]) -> Vec<f64> {
        let hist_size = (t.len() as f64 * self.changepoint_range).floor() as usize;
        let n_cp = self.n_changepoints.min(hist_size.saturating_sub(1));
        if n_cp == 0 {
            return Vec::new();
        }

        let last = (hist_size - 1) as f64;
        (1..=n_cp)
            .map(|i| {
                let idx = (last * i as f64 / n_cp as f64).round() as usize;
                t[idx]
            })
            .collect()
    }

    fn features(state: &FittedState, date: NaiveDate) -> Vec<f64> {
        let days = (date - state.start).num_days() as f64;
        let t = days / state.span_days;

        let mut row = Vec::with_capacity(
            2 + state.changepoints.len() + 2 * (state.weekly_order + state.yearly_order),
        );
        row.push(1.0);
        row.push(t);
        row.extend(state.changepoints.iter().map(|&cp| (t - cp).max(0.0)));
        push_fourier(&mut row, days, 7.0, state.weekly_order);
        push_fourier(&mut row, days, 365.25, state.yearly_order);
        row
    }

    fn penalties(&self, state: &FittedState) -> Vec<f64> {
        let cp = NOISE_VARIANCE / self.changepoint_prior_scale.powi(2);
        let season = NOISE_VARIANCE / self.seasonality_prior_scale.powi(2);
        let n_season = 2 * (state.weekly_order + state.yearly_order);

        let mut penalties = vec![UNPENALISED, UNPENALISED];
        penalties.extend(std::iter::repeat(cp).take(state.changepoints.len()));
        penalties.extend(std::iter::repeat(season).take(n_season));
        penalties
    }
}

fn push_fourier(row: &mut Vec<f64>, days: f64, period: f64, order: usize) {
    for k in 1..=order {
        let x = 2.0 * PI * k as f64 * days / period;
        row.push(x.sin());
        row.push(x.cos());
    }
}

impl Forecaster for AdditiveModel {
    fn fit(&mut self, dates: &[NaiveDate], values: &[f64]) -> Result<()> {
        if dates.len() != values.len() {
            return Err(PipelineError::ModelFit(format!(
                "{} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        if values.len() < 2 {
            return Err(PipelineError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PipelineError::ModelFit(
                "observation dates must be strictly increasing".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::ModelFit(
                "observations contain non-finite values".to_string(),
            ));
        }

        let start = dates[0];
        let span_days = (dates[dates.len() - 1] - start).num_days() as f64;
        let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let scale = if scale > 0.0 { scale } else { 1.0 };

        let t: Vec<f64> = dates
            .iter()
            .map(|d| (*d - start).num_days() as f64 / span_days)
            .collect();

        // Seasonal terms need at least two full cycles of history.
        let mut state = FittedState {
            start,
            span_days,
            scale,
            changepoints: self.place_changepoints(&t),
            weekly_order: if span_days >= 14.0 { self.weekly_order } else { 0 },
            yearly_order: if span_days >= 730.0 { self.yearly_order } else { 0 },
            coefficients: Vec::new(),
        };

        let design: Vec<Vec<f64>> = dates.iter().map(|d| Self::features(&state, *d)).collect();
        let y: Vec<f64> = values.iter().map(|v| v / scale).collect();
        state.coefficients = ridge_fit(&design, &y, &self.penalties(&state))?;

        debug!(
            "Fitted {} on {} points: {} changepoints, weekly order {}, yearly order {}",
            self.name(),
            values.len(),
            state.changepoints.len(),
            state.weekly_order,
            state.yearly_order
        );
        self.state = Some(state);
        Ok(())
    }

    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<f64>> {
        let state = self.state.as_ref().ok_or_else(|| {
            PipelineError::ModelFit("model must be fitted before prediction".to_string())
        })?;

        Ok(dates
            .iter()
            .map(|d| {
                let row = Self::features(state, *d);
                let y: f64 = row
                    .iter()
                    .zip(&state.coefficients)
                    .map(|(x, b)| x * b)
                    .sum();
                y * state.scale
            })
            .collect())
    }

    fn name(&self) -> &str {
        "AdditiveModel"
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}

/// History dates followed by `periods` daily dates past the last one.
pub fn make_future_dates(history: &[NaiveDate], periods: usize) -> Vec<NaiveDate> {
    let mut dates = history.to_vec();
    if let Some(&last) = history.last() {
        dates.extend((1..=periods as i64).map(|i| last + Duration::days(i)));
    }
    dates
}

/// Fit `model` on the full history and return the `horizon` days after it.
pub fn forecast_with(
    model: &mut dyn Forecaster,
    dates: &[NaiveDate],
    values: &[f64],
    horizon: usize,
) -> Result<ForecastSeries> {
    model.fit(dates, values)?;

    let last = *dates.last().ok_or(PipelineError::InsufficientData { needed: 2, got: 0 })?;
    let future = make_future_dates(dates, horizon);
    let predicted = model.predict(&future)?;

    // Keep rows from the last observed date on, then drop that boundary row.
    let (dates, values): (Vec<NaiveDate>, Vec<f64>) = future
        .into_iter()
        .zip(predicted)
        .filter(|(d, _)| *d >= last)
        .skip(1)
        .unzip();

    if values.len() != horizon {
        return Err(PipelineError::ModelFit(format!(
            "expected {} forecast rows, got {}",
            horizon,
            values.len()
        )));
    }
    Ok(ForecastSeries { dates, values })
}

/// Forecast with a freshly constructed default model.
pub fn forecast(dates: &[NaiveDate], values: &[f64], horizon: usize) -> Result<ForecastSeries> {
    let mut model = AdditiveModel::new();
    forecast_with(&mut model, dates, values, horizon)
}
