//! Core data structures: observations, per-country series, forecasts.

pub mod forecast;
pub mod observation;
pub mod series;

pub use forecast::Forecast;
pub use observation::{CountryMeta, CoverageObservation, ObservationTable};
pub use series::{excluded_countries, prepare_series, CountrySeries};
