//! Reported coverage observations and the deduplicated table they live in.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Country descriptors carried alongside coverage values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryMeta {
    /// Country name.
    pub country: String,
    /// World region.
    pub region: String,
    /// World Bank income group.
    pub income_group: String,
}

/// One reported coverage value for a (country, year) pair.
///
/// Coverage is a fraction in `[0, 1]`, or `None` where the registry has
/// no report for that year. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageObservation {
    /// ISO3 country code.
    pub iso: String,
    /// Country descriptors.
    pub meta: CountryMeta,
    /// Calendar year of the report.
    pub year: i32,
    /// Reported coverage fraction, if any.
    pub coverage: Option<f64>,
}

impl CoverageObservation {
    /// Build an observation, checking the coverage range.
    pub fn new(
        iso: impl Into<String>,
        meta: CountryMeta,
        year: i32,
        coverage: Option<f64>,
    ) -> Result<Self> {
        if let Some(value) = coverage {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(ForecastError::InvalidParameter(format!(
                    "coverage must be a fraction in [0, 1], got {value}"
                )));
            }
        }
        Ok(Self {
            iso: iso.into(),
            meta,
            year,
            coverage,
        })
    }
}

/// A deduplicated coverage table keyed by (country, year).
///
/// The data-loading collaborator delivers the rows; this type owns the
/// validated in-memory form. At most one observation exists per
/// (country, year); inserting a second is an error, not a silent
/// overwrite.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    rows: BTreeMap<String, BTreeMap<i32, CoverageObservation>>,
}

impl ObservationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from rows, rejecting duplicate (country, year) keys.
    pub fn from_rows(rows: impl IntoIterator<Item = CoverageObservation>) -> Result<Self> {
        let mut table = Self::new();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }

    /// Insert a single observation.
    pub fn insert(&mut self, observation: CoverageObservation) -> Result<()> {
        let by_year = self.rows.entry(observation.iso.clone()).or_default();
        if by_year.contains_key(&observation.year) {
            return Err(ForecastError::DuplicateObservation {
                iso: observation.iso,
                year: observation.year,
            });
        }
        by_year.insert(observation.year, observation);
        Ok(())
    }

    /// Look up the observation for a (country, year) pair.
    pub fn get(&self, iso: &str, year: i32) -> Option<&CoverageObservation> {
        self.rows.get(iso)?.get(&year)
    }

    /// All observations for one country, ordered by year.
    pub fn country_rows(&self, iso: &str) -> Option<&BTreeMap<i32, CoverageObservation>> {
        self.rows.get(iso)
    }

    /// ISO codes present in the table, in ascending order.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Number of countries in the table.
    pub fn num_countries(&self) -> usize {
        self.rows.len()
    }

    /// Total number of observations.
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Whether the table holds no observations.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate all observations, ordered by (country, year).
    pub fn iter(&self) -> impl Iterator<Item = &CoverageObservation> {
        self.rows.values().flat_map(BTreeMap::values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> CountryMeta {
        CountryMeta {
            country: "Angola".to_string(),
            region: "Sub-Saharan Africa".to_string(),
            income_group: "Lower middle income".to_string(),
        }
    }

    #[test]
    fn insert_and_get() {
        let mut table = ObservationTable::new();
        let obs = CoverageObservation::new("AGO", meta(), 2015, Some(0.64)).unwrap();
        table.insert(obs.clone()).unwrap();

        assert_eq!(table.get("AGO", 2015), Some(&obs));
        assert_eq!(table.get("AGO", 2016), None);
        assert_eq!(table.get("BDI", 2015), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.num_countries(), 1);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut table = ObservationTable::new();
        table
            .insert(CoverageObservation::new("AGO", meta(), 2015, Some(0.64)).unwrap())
            .unwrap();

        let err = table
            .insert(CoverageObservation::new("AGO", meta(), 2015, Some(0.65)).unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            ForecastError::DuplicateObservation {
                iso: "AGO".to_string(),
                year: 2015,
            }
        );
    }

    #[test]
    fn coverage_out_of_range_is_rejected() {
        assert!(CoverageObservation::new("AGO", meta(), 2015, Some(1.2)).is_err());
        assert!(CoverageObservation::new("AGO", meta(), 2015, Some(-0.1)).is_err());
        assert!(CoverageObservation::new("AGO", meta(), 2015, Some(f64::NAN)).is_err());
        assert!(CoverageObservation::new("AGO", meta(), 2015, None).is_ok());
    }

    #[test]
    fn countries_are_sorted() {
        let mut table = ObservationTable::new();
        for iso in ["NGA", "AGO", "KEN"] {
            table
                .insert(CoverageObservation::new(iso, meta(), 2015, Some(0.7)).unwrap())
                .unwrap();
        }
        let countries: Vec<&str> = table.countries().collect();
        assert_eq!(countries, vec!["AGO", "KEN", "NGA"]);
    }

    #[test]
    fn iter_orders_by_country_then_year() {
        let mut table = ObservationTable::new();
        table
            .insert(CoverageObservation::new("KEN", meta(), 2016, Some(0.8)).unwrap())
            .unwrap();
        table
            .insert(CoverageObservation::new("AGO", meta(), 2015, Some(0.6)).unwrap())
            .unwrap();
        table
            .insert(CoverageObservation::new("AGO", meta(), 2014, Some(0.6)).unwrap())
            .unwrap();

        let keys: Vec<(&str, i32)> = table.iter().map(|o| (o.iso.as_str(), o.year)).collect();
        assert_eq!(keys, vec![("AGO", 2014), ("AGO", 2015), ("KEN", 2016)]);
    }
}
