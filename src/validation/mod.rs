//! Statistical validation utilities.

pub mod stationarity;

pub use stationarity::{kpss_test, CriticalValues, StationarityResult};
