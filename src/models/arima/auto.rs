//! Automatic ARIMA order selection for annual coverage series.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::difference;
use crate::models::arima::model::{Arima, ArimaOrder};
use crate::models::Forecaster;
use crate::utils::stats::is_constant;
use crate::validation::stationarity::kpss_test;
use tracing::{debug, warn};

/// Configuration for automatic order selection.
#[derive(Debug, Clone)]
pub struct AutoArimaConfig {
    /// Maximum AR order to consider.
    pub max_p: usize,
    /// Maximum MA order to consider.
    pub max_q: usize,
    /// Maximum differencing order.
    pub max_d: usize,
}

impl Default for AutoArimaConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_d: 2,
        }
    }
}

impl AutoArimaConfig {
    /// Set maximum orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }
}

/// Smallest differencing order at which the series is judged stationary.
///
/// KPSS is applied to the raw series and then to successively
/// differenced series. The decision uses the 10% critical value rather
/// than 5%: with 10-20 annual points the test has little power, and
/// under-differencing a trending coverage series turns trend
/// extrapolation into mean reversion. Capped at `max_d` to avoid
/// over-differencing short series.
pub fn select_differencing(values: &[f64], max_d: usize) -> usize {
    for d in 0..=max_d {
        let diffed = difference(values, d);
        if is_constant(&diffed) {
            return d;
        }
        let result = kpss_test(&diffed, None);
        if result.statistic.is_nan() || result.statistic < result.critical_values.cv_10pct {
            return d;
        }
    }
    max_d
}

/// Automatic ARIMA(p, d, q) selection.
///
/// Differencing is fixed first by [`select_differencing`]; (p, q) are
/// then searched over a bounded grid and scored by AIC. Candidates are
/// enumerated in ascending p + q, so an AIC tie resolves to the simpler
/// model. No seasonal terms: the data are annual.
#[derive(Debug, Clone)]
pub struct AutoArima {
    config: AutoArimaConfig,
    model: Option<Arima>,
    method: Option<String>,
    used_fallback: bool,
    scores: Vec<(ArimaOrder, f64)>,
}

impl AutoArima {
    /// Fewest observations automatic selection will accept.
    pub const MIN_OBSERVATIONS: usize = 8;

    /// Create a selector with default configuration.
    pub fn new() -> Self {
        Self::with_config(AutoArimaConfig::default())
    }

    /// Create a selector with custom configuration.
    pub fn with_config(config: AutoArimaConfig) -> Self {
        Self {
            config,
            model: None,
            method: None,
            used_fallback: false,
            scores: Vec::new(),
        }
    }

    /// Selected (p, d, q), if fitted.
    pub fn selected_order(&self) -> Option<ArimaOrder> {
        self.model.as_ref().map(Arima::order)
    }

    /// Descriptive label of the selected model.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Whether selection fell back to the naive (0, d, 0) order because
    /// no grid candidate converged.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    /// AIC scores of all converged candidates, best first.
    pub fn scores(&self) -> &[(ArimaOrder, f64)] {
        &self.scores
    }

    /// The selected fitted model, if any.
    pub fn model(&self) -> Option<&Arima> {
        self.model.as_ref()
    }

    fn search(&mut self, values: &[f64], d: usize) -> Option<Arima> {
        let n_diff = values.len() - d;
        let mut best: Option<(Arima, f64)> = None;

        for total in 0..=(self.config.max_p + self.config.max_q) {
            for p in 0..=total.min(self.config.max_p) {
                let q = total - p;
                if q > self.config.max_q {
                    continue;
                }

                // Cap the parameter count relative to the differenced
                // length, and leave residual degrees of freedom; both
                // guards bite on 10-20 point annual series.
                if p + q + 1 > n_diff / 3 {
                    continue;
                }
                let usable = n_diff.saturating_sub(p.max(q));
                if usable < p + q + 3 {
                    continue;
                }

                let mut candidate = Arima::new(p, d, q);
                if let Err(err) = candidate.fit(values) {
                    debug!(p, d, q, %err, "candidate excluded");
                    continue;
                }
                let aic = match candidate.aic() {
                    Some(aic) if aic.is_finite() => aic,
                    _ => continue,
                };

                self.scores.push((candidate.order(), aic));
                // Strict improvement: enumeration is simplest-first, so
                // equal AIC keeps the earlier, simpler order.
                if best.as_ref().map_or(true, |(_, score)| aic < *score) {
                    best = Some((candidate, aic));
                }
            }
        }

        self.scores
            .sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        best.map(|(model, _)| model)
    }
}

impl Default for AutoArima {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoArima {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.len() < Self::MIN_OBSERVATIONS {
            return Err(ForecastError::InsufficientData {
                needed: Self::MIN_OBSERVATIONS,
                got: values.len(),
            });
        }

        self.scores.clear();
        self.used_fallback = false;

        // Constant coverage: the degenerate model, no search at all.
        if is_constant(values) {
            self.model = Some(Arima::constant(values[0], values.len()));
            self.method = Some("constant".to_string());
            return Ok(());
        }

        let d = select_differencing(values, self.config.max_d);

        // A series whose d-th difference is exactly constant is fit by
        // the pure drift model; the likelihood search would degenerate.
        let diffed = difference(values, d);
        if is_constant(&diffed) {
            let mut model = Arima::new(0, d, 0);
            model.fit(values)?;
            self.method = Some(model.order().label());
            self.model = Some(model);
            return Ok(());
        }

        match self.search(values, d) {
            Some(model) => {
                debug!(order = %model.order().label(), "selected model");
                self.method = Some(model.order().label());
                self.model = Some(model);
            }
            None => {
                // No candidate converged; never abort the country.
                warn!(d, "no ARIMA candidate converged, using naive fallback");
                let mut model = Arima::new(0, d, 0);
                model.fit(values)?;
                self.method = Some(format!("{} fallback", model.order().label()));
                self.model = Some(model);
                self.used_fallback = true;
            }
        }

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        match self.model.as_ref() {
            Some(model) => model.predict(horizon),
            None => Err(ForecastError::FitRequired),
        }
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        match self.model.as_ref() {
            Some(model) => model.predict_with_intervals(horizon, level),
            None => Err(ForecastError::FitRequired),
        }
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.model.as_ref().and_then(Arima::fitted_values)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.model.as_ref().and_then(Arima::residuals)
    }

    fn name(&self) -> &str {
        "AutoARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn trending_coverage_selects_differencing() {
        // Ten years of mild scale-up with small reporting wobble.
        let values = [0.80, 0.82, 0.81, 0.83, 0.85, 0.84, 0.86, 0.87, 0.88, 0.90];

        let mut selector = AutoArima::new();
        selector.fit(&values).unwrap();

        let order = selector.selected_order().unwrap();
        assert!(order.d >= 1);
        assert!(order.p + order.d + order.q > 0);
        assert!(!selector.used_fallback());

        // Extrapolates the scale-up instead of reverting to the mean.
        let forecast = selector.predict(2).unwrap();
        assert!(forecast.mean()[0] > 0.90);
        assert!(forecast.mean()[1] > forecast.mean()[0] - 0.01);
    }

    #[test]
    fn constant_series_selects_degenerate_model() {
        let values = [0.95; 12];

        let mut selector = AutoArima::new();
        selector.fit(&values).unwrap();

        assert_eq!(selector.selected_order().unwrap(), ArimaOrder::new(0, 0, 0));
        assert_eq!(selector.method(), Some("constant"));

        let forecast = selector.predict_with_intervals(2, 0.95).unwrap();
        for step in 0..2 {
            assert_relative_eq!(forecast.mean()[step], 0.95);
            assert_relative_eq!(forecast.lower().unwrap()[step], 0.95);
            assert_relative_eq!(forecast.upper().unwrap()[step], 0.95);
        }
    }

    #[test]
    fn exactly_linear_series_takes_drift_shortcut() {
        // Steps of 1/64 are exactly representable, so the first
        // difference is exactly constant.
        let values: Vec<f64> = (0..12).map(|i| 0.5 + i as f64 / 64.0).collect();

        let mut selector = AutoArima::new();
        selector.fit(&values).unwrap();

        let order = selector.selected_order().unwrap();
        assert_eq!(order, ArimaOrder::new(0, 1, 0));
        assert_eq!(selector.method(), Some("ARIMA(0,1,0)"));

        let forecast = selector.predict(2).unwrap();
        assert_relative_eq!(forecast.mean()[0], 0.5 + 12.0 / 64.0, epsilon = 1e-12);
        assert_relative_eq!(forecast.mean()[1], 0.5 + 13.0 / 64.0, epsilon = 1e-12);
    }

    #[test]
    fn stationary_series_keeps_d_zero() {
        let values: Vec<f64> = (0..20)
            .map(|i| 0.85 + ((i * 17 + 13) % 97) as f64 / 5000.0 - 0.0097)
            .collect();

        let d = select_differencing(&values, 2);
        assert_eq!(d, 0);
    }

    #[test]
    fn trending_series_gets_differenced() {
        let values: Vec<f64> = (0..20).map(|i| 0.50 + 0.02 * i as f64).collect();
        let d = select_differencing(&values, 2);
        assert!(d >= 1);
    }

    #[test]
    fn scores_sorted_ascending() {
        let values: Vec<f64> = (0..21)
            .map(|i| 0.70 + 0.008 * i as f64 + 0.01 * (i as f64 * 1.1).sin())
            .collect();

        let mut selector = AutoArima::new();
        selector.fit(&values).unwrap();

        let scores = selector.scores();
        assert!(!scores.is_empty());
        for pair in scores.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn insufficient_data_is_an_error() {
        let mut selector = AutoArima::new();
        assert!(matches!(
            selector.fit(&[0.8, 0.81, 0.82, 0.83, 0.84]),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn predict_requires_fit() {
        let selector = AutoArima::new();
        assert!(matches!(
            selector.predict(2),
            Err(ForecastError::FitRequired)
        ));
    }

    #[test]
    fn config_builder() {
        let config = AutoArimaConfig::default().with_max_orders(3, 1, 2);
        assert_eq!(config.max_p, 3);
        assert_eq!(config.max_d, 1);
        assert_eq!(config.max_q, 2);
    }

    #[test]
    fn refit_clears_previous_state() {
        let mut selector = AutoArima::new();
        selector.fit(&[0.95; 12]).unwrap();
        assert_eq!(selector.method(), Some("constant"));

        let values: Vec<f64> = (0..15)
            .map(|i| 0.70 + 0.01 * i as f64 + 0.005 * (i as f64 * 1.7).sin())
            .collect();
        selector.fit(&values).unwrap();
        assert_ne!(selector.method(), Some("constant"));
    }
}
