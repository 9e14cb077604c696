//! Per-country annual coverage series and their preparation.

use crate::config::AnalysisWindow;
use crate::core::observation::{CountryMeta, ObservationTable};
use serde::{Deserialize, Serialize};

/// A gap-free annual coverage series for one country.
///
/// Values are indexed by contiguous years starting at `start_year` and
/// span exactly the analysis window. Derived once from the observation
/// table and read-only thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySeries {
    iso: String,
    meta: CountryMeta,
    start_year: i32,
    values: Vec<f64>,
}

impl CountrySeries {
    /// ISO3 country code.
    pub fn iso(&self) -> &str {
        &self.iso
    }

    /// Country descriptors.
    pub fn meta(&self) -> &CountryMeta {
        &self.meta
    }

    /// First year of the series.
    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// Final year of the series.
    pub fn end_year(&self) -> i32 {
        self.start_year + self.values.len() as i32 - 1
    }

    /// Number of annual values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All coverage values in year order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Split into training values and the held-out final `horizon` years.
    ///
    /// The holdout is the reported coverage the forecast is compared
    /// against; the model never sees it.
    pub fn training_split(&self, horizon: usize) -> (&[f64], &[f64]) {
        let cut = self.values.len().saturating_sub(horizon);
        self.values.split_at(cut)
    }

    /// Year of the value at `index`.
    pub fn year_at(&self, index: usize) -> i32 {
        self.start_year + index as i32
    }
}

/// Build one gap-free series per country with a complete window.
///
/// A country qualifies only if it has a non-missing coverage value for
/// every year in the window; countries missing even one year are dropped
/// entirely. Pure transform: re-running on the same table yields the
/// same series in the same (ISO-ascending) order, and an input without
/// qualifying countries yields an empty vector, not an error.
pub fn prepare_series(table: &ObservationTable, window: &AnalysisWindow) -> Vec<CountrySeries> {
    let mut series = Vec::new();

    for iso in table.countries() {
        let rows = match table.country_rows(iso) {
            Some(rows) => rows,
            None => continue,
        };

        let mut values = Vec::with_capacity(window.len());
        let mut complete = true;
        for year in window.years() {
            match rows.get(&year).and_then(|obs| obs.coverage) {
                Some(value) => values.push(value),
                None => {
                    complete = false;
                    break;
                }
            }
        }

        if !complete {
            continue;
        }

        // Metadata comes from the first window-year row.
        let meta = rows
            .get(&window.start_year)
            .map(|obs| obs.meta.clone())
            .unwrap_or_else(|| CountryMeta {
                country: iso.to_string(),
                region: String::new(),
                income_group: String::new(),
            });

        series.push(CountrySeries {
            iso: iso.to_string(),
            meta,
            start_year: window.start_year,
            values,
        });
    }

    series
}

/// ISO codes present in the table but lacking a complete window.
pub fn excluded_countries(table: &ObservationTable, window: &AnalysisWindow) -> Vec<String> {
    let qualifying: std::collections::BTreeSet<String> = prepare_series(table, window)
        .into_iter()
        .map(|s| s.iso)
        .collect();
    table
        .countries()
        .filter(|iso| !qualifying.contains(*iso))
        .map(str::to_string)
        .collect()
}
