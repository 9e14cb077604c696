//! ARIMA models and automatic order selection.

pub mod auto;
pub mod diff;
pub mod model;

pub use auto::{select_differencing, AutoArima, AutoArimaConfig};
pub use model::{Arima, ArimaOrder};
