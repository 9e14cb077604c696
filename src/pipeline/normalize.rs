//! Domain capping and long-format restructuring of raw forecasts.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// One normalized forecast for a (country, year) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// ISO3 country code.
    pub iso: String,
    /// Target year of this forecast step.
    pub year: i32,
    /// Point forecast.
    pub mean: f64,
    /// Lower interval bound.
    pub lower: f64,
    /// Upper interval bound.
    pub upper: f64,
    /// Confidence level of the interval.
    pub level: f64,
    /// Descriptive model label.
    pub method: String,
}

/// Cap a multi-year forecast to the valid coverage range and unpivot it
/// into one record per target year.
///
/// Reported coverage never reaches 100%, so means and upper bounds are
/// capped at `cap` while lower bounds are floored at zero; each of the
/// three values is clamped on its own. Bounds are then re-ordered around
/// the mean so `0 <= lower <= mean <= upper <= cap` holds in every
/// record. The year tag comes from the forecast step index, never from
/// the position of a row after sorting.
pub fn normalize_forecast(
    iso: &str,
    method: &str,
    forecast: &Forecast,
    level: f64,
    first_year: i32,
    cap: f64,
) -> Result<Vec<ForecastRecord>> {
    let (lower, upper) = match (forecast.lower(), forecast.upper()) {
        (Some(lower), Some(upper)) => (lower, upper),
        _ => {
            return Err(ForecastError::ComputationError(format!(
                "forecast for {iso} has no prediction intervals"
            )))
        }
    };

    let mut records = Vec::with_capacity(forecast.horizon());
    for (step, &mean) in forecast.mean().iter().enumerate() {
        let mean = mean.clamp(0.0, cap);
        let lower = lower[step].max(0.0).min(mean);
        let upper = upper[step].min(cap).max(mean);

        records.push(ForecastRecord {
            iso: iso.to_string(),
            year: first_year + step as i32,
            mean,
            lower,
            upper,
            level,
            method: method.to_string(),
        });
    }

    Ok(records)
}
