//! # coverage-forecast
//!
//! Estimates the impact of a global disruption on routine childhood
//! vaccination coverage by comparing reported coverage against a
//! projected "expected" trend, for every country with sufficient
//! history.
//!
//! The core is a per-country ARIMA engine: automatic (p, d, q) selection
//! via KPSS stationarity testing and AIC search, interval forecasting
//! over a one-to-two year horizon, capping to the valid coverage range,
//! and derivation of reported-minus-expected deltas. A sensitivity sweep
//! repeats the interval computation across confidence levels. Countries
//! are modeled independently and in parallel.

#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::{AnalysisConfig, AnalysisWindow, Antigen};
    pub use crate::core::{
        prepare_series, CountryMeta, CountrySeries, CoverageObservation, Forecast,
        ObservationTable,
    };
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::arima::{Arima, ArimaOrder, AutoArima};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{
        run_analysis, AnalysisOutput, DeltaClass, DeltaRecord, ForecastRecord, SensitivityRow,
    };
}
