//! Forecast container holding point predictions and optional intervals.

use crate::error::{ForecastError, Result};

/// Point forecasts with optional prediction intervals, one value per
/// forecast step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    mean: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions only.
    pub fn from_mean(mean: Vec<f64>) -> Self {
        Self {
            mean,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    ///
    /// All three vectors must share one length.
    pub fn with_intervals(mean: Vec<f64>, lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.len() != mean.len() || upper.len() != mean.len() {
            return Err(ForecastError::ComputationError(format!(
                "interval lengths {}/{} do not match horizon {}",
                lower.len(),
                upper.len(),
                mean.len()
            )));
        }
        Ok(Self {
            mean,
            lower: Some(lower),
            upper: Some(upper),
        })
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.mean.len()
    }

    /// Whether the forecast holds no steps.
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Point predictions.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Lower interval bounds, if computed.
    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    /// Upper interval bounds, if computed.
    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Whether prediction intervals are present.
    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }
}
