//! ARIMA (Autoregressive Integrated Moving Average) model.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate};
use crate::models::Forecaster;
use crate::utils::optimization::{minimize, SimplexOptions};
use crate::utils::stats::interval_z;

/// ARIMA model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArimaOrder {
    /// AR order (p).
    pub p: usize,
    /// Differencing order (d).
    pub d: usize,
    /// MA order (q).
    pub q: usize,
}

impl ArimaOrder {
    /// Create a new order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Total number of estimated parameters (AR + MA + intercept).
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }

    /// Combined AR and MA order, used for simplicity tie-breaking.
    pub fn complexity(&self) -> usize {
        self.p + self.q
    }

    /// Human-readable label, e.g. `ARIMA(1,1,0)`.
    pub fn label(&self) -> String {
        format!("ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA forecasting model for a single annual series.
///
/// Parameters are estimated by minimizing the conditional sum of squares
/// with a bounded simplex search; the Gaussian log-likelihood implied by
/// the residual variance yields AIC and BIC.
#[derive(Debug, Clone)]
pub struct Arima {
    order: ArimaOrder,
    ar: Vec<f64>,
    ma: Vec<f64>,
    intercept: f64,
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    fitted_diff: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
}

impl Arima {
    /// Create a new unfitted model with the given order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            order: ArimaOrder::new(p, d, q),
            ar: vec![],
            ma: vec![],
            intercept: 0.0,
            original: None,
            differenced: None,
            fitted_diff: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            bic: None,
        }
    }

    /// Build the degenerate fitted model for a constant series.
    ///
    /// Selected when a series has zero variance: forecasts equal the
    /// observed constant with a zero-width interval, and no numerical
    /// search runs at all.
    pub fn constant(value: f64, n: usize) -> Self {
        Self {
            order: ArimaOrder::new(0, 0, 0),
            ar: vec![],
            ma: vec![],
            intercept: value,
            original: Some(vec![value; n]),
            differenced: Some(vec![value; n]),
            fitted_diff: Some(vec![value; n]),
            residuals: Some(vec![0.0; n]),
            residual_variance: Some(0.0),
            aic: None,
            bic: None,
        }
    }

    /// Model order.
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    /// MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// Intercept on the differenced scale.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Akaike information criterion, if computable.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Bayesian information criterion, if computable.
    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// One-step residual variance.
    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    /// Conditional sum of squares for candidate parameters.
    fn css(diff: &[f64], p: usize, q: usize, ar: &[f64], ma: &[f64], intercept: f64) -> f64 {
        let n = diff.len();
        let start = p.max(q);
        if n <= start {
            return f64::MAX;
        }

        let mut residuals = vec![0.0; n];
        let mut total = 0.0;

        for t in start..n {
            let mut pred = intercept;
            for i in 0..p {
                pred += ar[i] * (diff[t - 1 - i] - intercept);
            }
            for i in 0..q {
                pred += ma[i] * residuals[t - 1 - i];
            }
            let error = diff[t] - pred;
            residuals[t] = error;
            total += error * error;
        }

        total
    }

    /// Estimate AR/MA coefficients and intercept on the differenced scale.
    fn estimate(&mut self, diff: &[f64]) -> Result<()> {
        let p = self.order.p;
        let q = self.order.q;
        let mean = diff.iter().sum::<f64>() / diff.len() as f64;

        if p == 0 && q == 0 {
            // Mean-only model; nothing to optimize.
            self.intercept = mean;
            self.ar = vec![];
            self.ma = vec![];
            return Ok(());
        }

        let mut start = vec![0.0; p + q + 1];
        start[0] = mean;
        for i in 0..p {
            start[1 + i] = 0.1 / (i + 1) as f64;
        }
        for i in 0..q {
            start[1 + p + i] = 0.1 / (i + 1) as f64;
        }

        // Coefficients bounded inside the unit interval for
        // stationarity/invertibility; the intercept is free.
        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(p + q));

        let outcome = minimize(
            |params| {
                let intercept = params[0];
                let ar = &params[1..1 + p];
                let ma = &params[1 + p..];
                Self::css(diff, p, q, ar, ma, intercept)
            },
            &start,
            Some(&bounds),
            SimplexOptions::default(),
        );

        if !outcome.converged || !outcome.value.is_finite() {
            return Err(ForecastError::NonConvergence {
                p,
                d: self.order.d,
                q,
            });
        }

        self.intercept = outcome.point[0];
        self.ar = outcome.point[1..1 + p].to_vec();
        self.ma = outcome.point[1 + p..].to_vec();
        Ok(())
    }

    /// Fitted values, residuals, and information criteria.
    fn compute_fitted(&mut self, diff: &[f64]) {
        let n = diff.len();
        let p = self.order.p;
        let q = self.order.q;
        let start = p.max(q);

        let mut fitted = vec![f64::NAN; n];
        let mut residuals = vec![0.0; n];

        for t in start..n {
            let mut pred = self.intercept;
            for i in 0..p {
                pred += self.ar[i] * (diff[t - 1 - i] - self.intercept);
            }
            for i in 0..q {
                pred += self.ma[i] * residuals[t - 1 - i];
            }
            fitted[t] = pred;
            residuals[t] = diff[t] - pred;
        }

        let valid = &residuals[start..];
        if !valid.is_empty() {
            let variance = valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64;
            self.residual_variance = Some(variance);

            if variance > 0.0 {
                let n_eff = valid.len() as f64;
                let k = self.order.num_params() as f64;
                let ll = -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());
                self.aic = Some(-2.0 * ll + 2.0 * k);
                self.bic = Some(-2.0 * ll + k * n_eff.ln());
            }
        }

        self.fitted_diff = Some(fitted);
        self.residuals = Some(residuals);
    }
}

impl Forecaster for Arima {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        let min_len = self.order.d + self.order.p.max(self.order.q) + 3;
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        self.original = Some(values.to_vec());

        let diff = difference(values, self.order.d);
        self.differenced = Some(diff.clone());

        self.estimate(&diff)?;
        self.compute_fitted(&diff);

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let diff = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let p = self.order.p;
        let q = self.order.q;

        // Recurse forward on the differenced scale; future shocks are
        // zero in expectation.
        let mut extended = diff.clone();
        let mut extended_residuals = residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;
            for i in 0..p {
                if t > i {
                    pred += self.ar[i] * (extended[t - 1 - i] - self.intercept);
                }
            }
            for i in 0..q {
                if t > i {
                    pred += self.ma[i] * extended_residuals[t - 1 - i];
                }
            }
            extended.push(pred);
            extended_residuals.push(0.0);
        }

        let forecast_diff = &extended[diff.len()..];
        let predictions = if self.order.d > 0 {
            integrate(forecast_diff, original, self.order.d)
        } else {
            forecast_diff.to_vec()
        };

        Ok(Forecast::from_mean(predictions))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }

        let forecast = self.predict(horizon)?;
        if horizon == 0 {
            return Ok(forecast);
        }

        let variance = self.residual_variance.unwrap_or(0.0);
        let z = interval_z(level);
        let mean = forecast.mean();

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);

        // Forecast-error variance accumulates with step number, so
        // intervals widen monotonically over the horizon.
        for step in 1..=horizon {
            let se = (variance * step as f64).sqrt();
            lower.push(mean[step - 1] - z * se);
            upper.push(mean[step - 1] + z * se);
        }

        Forecast::with_intervals(mean.to_vec(), lower, upper)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted_diff.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}
