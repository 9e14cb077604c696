//! Forecaster trait defining the model interface.

use crate::core::Forecast;
use crate::error::Result;

/// Common interface for forecasting models over an annual series.
///
/// Object-safe, so fitted models can be held as `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to an ordered sequence of annual values.
    fn fit(&mut self, values: &[f64]) -> Result<()>;

    /// Generate point predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with prediction intervals at `level`.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast>;

    /// Fitted values (in-sample predictions), if fitted.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Residuals (actual minus fitted), if fitted.
    fn residuals(&self) -> Option<&[f64]>;

    /// Model name.
    fn name(&self) -> &str;

    /// Whether the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}
