//! Batch analysis pipeline.
//!
//! Countries are mutually independent, so model selection and
//! forecasting run as a parallel map over the prepared series. The only
//! shared state is the output collection each country contributes at
//! most one entry per table to; per-country failures are collected and
//! reported in aggregate, never allowed to abort the batch.

pub mod delta;
pub mod normalize;
pub mod sensitivity;

pub use delta::{compute_deltas, DeltaClass, DeltaRecord};
pub use normalize::{normalize_forecast, ForecastRecord};
pub use sensitivity::{sensitivity_sweep, SensitivityRow};

use crate::config::AnalysisConfig;
use crate::core::observation::{CountryMeta, ObservationTable};
use crate::core::series::{excluded_countries, prepare_series, CountrySeries};
use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::arima::{ArimaOrder, AutoArima};
use crate::models::Forecaster;
use rayon::prelude::*;
use tracing::{debug, warn};

/// A fitted per-country model with its selection metadata.
///
/// Created by the selector, consumed by the forecasting stages; the
/// fitted parameters stay opaque to everything downstream.
#[derive(Debug, Clone)]
pub struct FittedCoverageModel {
    iso: String,
    meta: CountryMeta,
    order: ArimaOrder,
    method: String,
    fallback: bool,
    selector: AutoArima,
}

impl FittedCoverageModel {
    /// Select and fit a model on the series' training years.
    pub fn fit(series: &CountrySeries, horizon: usize) -> Result<Self> {
        let (train, _holdout) = series.training_split(horizon);

        let mut selector = AutoArima::new();
        selector.fit(train)?;

        let order = selector.selected_order().ok_or(ForecastError::FitRequired)?;
        let method = selector
            .method()
            .map(str::to_string)
            .unwrap_or_else(|| order.label());

        debug!(iso = %series.iso(), method = %method, "fitted country model");

        Ok(Self {
            iso: series.iso().to_string(),
            meta: series.meta().clone(),
            order,
            method,
            fallback: selector.used_fallback(),
            selector,
        })
    }

    /// ISO3 country code.
    pub fn iso(&self) -> &str {
        &self.iso
    }

    /// Country descriptors.
    pub fn meta(&self) -> &CountryMeta {
        &self.meta
    }

    /// Selected (p, d, q).
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Descriptive model label.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Whether selection fell back to the naive order.
    pub fn used_fallback(&self) -> bool {
        self.fallback
    }

    /// Forecast `horizon` years with intervals at `level`.
    pub fn forecast(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selector.predict_with_intervals(horizon, level)
    }
}

/// Fit models for all prepared series in parallel.
///
/// Returns the fitted models and, separately, the countries whose fit
/// failed outright. Failure of one country never affects another.
pub fn fit_models(
    series: &[CountrySeries],
    horizon: usize,
) -> (Vec<FittedCoverageModel>, Vec<(String, ForecastError)>) {
    let results: Vec<Result<FittedCoverageModel>> = series
        .par_iter()
        .map(|s| FittedCoverageModel::fit(s, horizon))
        .collect();

    let mut models = Vec::with_capacity(series.len());
    let mut failures = Vec::new();
    for (s, result) in series.iter().zip(results) {
        match result {
            Ok(model) => models.push(model),
            Err(err) => {
                warn!(iso = %s.iso(), %err, "model fit failed, skipping country");
                failures.push((s.iso().to_string(), err));
            }
        }
    }

    (models, failures)
}

/// Forecast every fitted model and normalize into long-format records.
///
/// A country whose forecast fails is skipped with a log line; each
/// remaining country contributes exactly one record per forecast year.
pub fn forecast_records(
    models: &[FittedCoverageModel],
    config: &AnalysisConfig,
    level: f64,
) -> Vec<ForecastRecord> {
    let first_year = config.first_forecast_year();
    let mut records = Vec::with_capacity(models.len() * config.horizon);

    for model in models {
        let forecast = match model.forecast(config.horizon, level) {
            Ok(forecast) => forecast,
            Err(err) => {
                warn!(iso = %model.iso(), %err, "forecast failed, skipping country");
                continue;
            }
        };
        match normalize_forecast(
            model.iso(),
            model.method(),
            &forecast,
            level,
            first_year,
            config.coverage_cap,
        ) {
            Ok(mut normalized) => records.append(&mut normalized),
            Err(err) => {
                warn!(iso = %model.iso(), %err, "normalization failed, skipping country");
            }
        }
    }

    records
}

/// Everything one batch run produces.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// Normalized forecasts at the primary confidence level.
    pub forecasts: Vec<ForecastRecord>,
    /// Forecasts joined against reported coverage.
    pub deltas: Vec<DeltaRecord>,
    /// Significance counts per sweep confidence level.
    pub sensitivity: Vec<SensitivityRow>,
    /// Countries dropped for an incomplete window.
    pub excluded: Vec<String>,
    /// Countries whose selection used the naive fallback order.
    pub fallbacks: Vec<String>,
    /// Countries whose fit failed outright, with the error.
    pub failures: Vec<(String, ForecastError)>,
}

/// Run the full pipeline for one configuration.
pub fn run_analysis(table: &ObservationTable, config: &AnalysisConfig) -> Result<AnalysisOutput> {
    config.validate()?;

    let series = prepare_series(table, &config.window);
    let excluded = excluded_countries(table, &config.window);

    let (models, failures) = fit_models(&series, config.horizon);
    let fallbacks: Vec<String> = models
        .iter()
        .filter(|m| m.used_fallback())
        .map(|m| m.iso().to_string())
        .collect();

    let forecasts = forecast_records(&models, config, config.level);
    let deltas = compute_deltas(&forecasts, table);
    let sensitivity = sensitivity_sweep(&models, table, config);

    Ok(AnalysisOutput {
        forecasts,
        deltas,
        sensitivity,
        excluded,
        fallbacks,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisWindow;
    use crate::core::observation::CoverageObservation;

    fn meta(name: &str) -> CountryMeta {
        CountryMeta {
            country: name.to_string(),
            region: "Region".to_string(),
            income_group: "Low income".to_string(),
        }
    }

    fn steady_country(rows: &mut Vec<CoverageObservation>, iso: &str, base: f64) {
        for (i, year) in (2009..=2020).enumerate() {
            let coverage = (base + 0.004 * i as f64).min(0.99);
            rows.push(CoverageObservation::new(iso, meta(iso), year, Some(coverage)).unwrap());
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            window: AnalysisWindow::new(2009, 2020),
            horizon: 2,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn batch_produces_one_record_per_country_year() {
        let mut rows = Vec::new();
        steady_country(&mut rows, "AAA", 0.80);
        steady_country(&mut rows, "BBB", 0.70);
        steady_country(&mut rows, "CCC", 0.90);
        let table = ObservationTable::from_rows(rows).unwrap();

        let output = run_analysis(&table, &config()).unwrap();

        assert_eq!(output.forecasts.len(), 6);
        assert_eq!(output.deltas.len(), 6);
        assert!(output.excluded.is_empty());
        assert!(output.failures.is_empty());

        let mut keys: Vec<(String, i32)> = output
            .forecasts
            .iter()
            .map(|r| (r.iso.clone(), r.year))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 6);

        for record in &output.forecasts {
            assert!(record.year == 2019 || record.year == 2020);
            assert!(0.0 <= record.lower);
            assert!(record.lower <= record.mean);
            assert!(record.mean <= record.upper);
            assert!(record.upper <= 0.99);
        }
    }

    #[test]
    fn incomplete_country_is_excluded_not_fatal() {
        let mut rows = Vec::new();
        steady_country(&mut rows, "AAA", 0.80);
        // BBB misses 2015.
        for year in 2009..=2020 {
            if year == 2015 {
                continue;
            }
            rows.push(CoverageObservation::new("BBB", meta("BBB"), year, Some(0.7)).unwrap());
        }
        let table = ObservationTable::from_rows(rows).unwrap();

        let output = run_analysis(&table, &config()).unwrap();

        assert_eq!(output.excluded, vec!["BBB".to_string()]);
        assert_eq!(output.forecasts.len(), 2);
        assert!(output.forecasts.iter().all(|r| r.iso == "AAA"));
    }

    #[test]
    fn empty_table_yields_empty_output() {
        let table = ObservationTable::new();
        let output = run_analysis(&table, &config()).unwrap();

        assert!(output.forecasts.is_empty());
        assert!(output.deltas.is_empty());
        assert!(output.excluded.is_empty());
        assert_eq!(output.sensitivity.len(), config().sweep_levels.len());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let table = ObservationTable::new();
        let bad = AnalysisConfig {
            horizon: 5,
            ..config()
        };
        assert!(run_analysis(&table, &bad).is_err());
    }

    #[test]
    fn deltas_carry_metadata() {
        let mut rows = Vec::new();
        steady_country(&mut rows, "AAA", 0.80);
        let table = ObservationTable::from_rows(rows).unwrap();

        let output = run_analysis(&table, &config()).unwrap();
        assert!(!output.deltas.is_empty());
        for record in &output.deltas {
            assert_eq!(record.meta.income_group, "Low income");
            assert!(record.within_interval == (record.coverage >= record.lower && record.coverage <= record.upper));
        }
    }
}
