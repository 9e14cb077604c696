//! Analysis configuration.
//!
//! One configuration describes a single batch run: which antigen's
//! coverage table is analysed, the historical window, the forecast
//! horizon, and the confidence levels of interest. The antigen is an
//! explicit value threaded through the pipeline rather than an ambient
//! flag inspected inside stages.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Vaccine antigen whose coverage series is being analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Antigen {
    /// First dose of diphtheria-tetanus-pertussis vaccine.
    Dtp1,
    /// Third dose of diphtheria-tetanus-pertussis vaccine.
    Dtp3,
    /// First dose of measles-containing vaccine.
    Mcv1,
}

impl std::fmt::Display for Antigen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Antigen::Dtp1 => "DTP1",
            Antigen::Dtp3 => "DTP3",
            Antigen::Mcv1 => "MCV1",
        };
        f.write_str(label)
    }
}

/// Inclusive window of annual observations required per country.
///
/// The final `horizon` years of the window are held out from model
/// training and serve as the reported values the forecast is compared
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    /// First year of the window.
    pub start_year: i32,
    /// Final year of the window (inclusive).
    pub end_year: i32,
}

impl AnalysisWindow {
    /// Create a window spanning `start_year..=end_year`.
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
        }
    }

    /// Number of years in the window.
    pub fn len(&self) -> usize {
        if self.end_year < self.start_year {
            0
        } else {
            (self.end_year - self.start_year + 1) as usize
        }
    }

    /// Whether the window contains no years.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the window years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start_year..=self.end_year
    }

    /// Whether `year` falls inside the window.
    pub fn contains(&self, year: i32) -> bool {
        year >= self.start_year && year <= self.end_year
    }
}

/// Configuration for one batch analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Antigen under analysis.
    pub antigen: Antigen,
    /// Required historical window per country.
    pub window: AnalysisWindow,
    /// Forecast horizon in years (1 or 2); also the number of final
    /// window years held out from training.
    pub horizon: usize,
    /// Primary confidence level for the forecast and delta tables.
    pub level: f64,
    /// Confidence levels for the sensitivity sweep.
    pub sweep_levels: Vec<f64>,
    /// Upper cap applied to forecast means and bounds. Reported
    /// coverage never reaches 100% in the source registry.
    pub coverage_cap: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            antigen: Antigen::Dtp3,
            window: AnalysisWindow::new(2000, 2020),
            horizon: 2,
            level: 0.95,
            sweep_levels: vec![0.30, 0.40, 0.50, 0.60, 0.70, 0.80, 0.90, 0.95, 0.99],
            coverage_cap: 0.99,
        }
    }
}

impl AnalysisConfig {
    /// Minimum number of training years left after the holdout split.
    pub const MIN_TRAINING_YEARS: usize = 8;

    /// First year the model forecasts (first held-out year).
    pub fn first_forecast_year(&self) -> i32 {
        self.window.end_year - self.horizon as i32 + 1
    }

    /// Number of training years (window length minus holdout).
    pub fn training_years(&self) -> usize {
        self.window.len().saturating_sub(self.horizon)
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.window.is_empty() {
            return Err(ForecastError::InvalidParameter(format!(
                "window {}..={} is empty",
                self.window.start_year, self.window.end_year
            )));
        }
        if self.horizon == 0 || self.horizon > 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "horizon must be 1 or 2, got {}",
                self.horizon
            )));
        }
        if self.training_years() < Self::MIN_TRAINING_YEARS {
            return Err(ForecastError::InsufficientData {
                needed: Self::MIN_TRAINING_YEARS + self.horizon,
                got: self.window.len(),
            });
        }
        for &level in self.sweep_levels.iter().chain(std::iter::once(&self.level)) {
            if !(level > 0.0 && level < 1.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "confidence level must be in (0, 1), got {level}"
                )));
            }
        }
        if !(self.coverage_cap > 0.0 && self.coverage_cap <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "coverage cap must be in (0, 1], got {}",
                self.coverage_cap
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.len(), 21);
        assert_eq!(config.training_years(), 19);
        assert_eq!(config.first_forecast_year(), 2019);
    }

    #[test]
    fn window_years_ascending() {
        let window = AnalysisWindow::new(2009, 2012);
        let years: Vec<i32> = window.years().collect();
        assert_eq!(years, vec![2009, 2010, 2011, 2012]);
        assert_eq!(window.len(), 4);
        assert!(window.contains(2010));
        assert!(!window.contains(2013));
    }

    #[test]
    fn rejects_zero_horizon() {
        let config = AnalysisConfig {
            horizon: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_three_year_horizon() {
        let config = AnalysisConfig {
            horizon: 3,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_short_training_window() {
        let config = AnalysisConfig {
            window: AnalysisWindow::new(2015, 2020),
            horizon: 2,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn rejects_bad_levels() {
        let config = AnalysisConfig {
            level: 1.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            sweep_levels: vec![0.5, 0.0],
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn antigen_labels() {
        assert_eq!(Antigen::Dtp1.to_string(), "DTP1");
        assert_eq!(Antigen::Dtp3.to_string(), "DTP3");
        assert_eq!(Antigen::Mcv1.to_string(), "MCV1");
    }

    #[test]
    fn config_serde_round_trip() {
        let config = AnalysisConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
