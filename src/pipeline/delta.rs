//! Joining forecasts against reported coverage.

use crate::core::observation::{CountryMeta, ObservationTable};
use crate::pipeline::normalize::ForecastRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A forecast joined with the reported coverage for the same
/// (country, year): the terminal artifact of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRecord {
    /// ISO3 country code.
    pub iso: String,
    /// Country descriptors for downstream grouping.
    pub meta: CountryMeta,
    /// Target year.
    pub year: i32,
    /// Descriptive model label.
    pub method: String,
    /// Confidence level of the interval.
    pub level: f64,
    /// Expected coverage (point forecast).
    pub mean: f64,
    /// Lower interval bound.
    pub lower: f64,
    /// Upper interval bound.
    pub upper: f64,
    /// Reported coverage.
    pub coverage: f64,
    /// Reported minus expected.
    pub delta: f64,
    /// Reported minus lower bound.
    pub lower_delta: f64,
    /// Reported minus upper bound.
    pub upper_delta: f64,
    /// Whether the report falls inside the interval.
    pub within_interval: bool,
    /// Width of the interval.
    pub interval_width: f64,
}

impl DeltaRecord {
    /// Classify this record; `within_interval` is authoritative, so a
    /// record inside its interval is never significant.
    pub fn classify(&self) -> DeltaClass {
        if self.within_interval {
            DeltaClass::Within
        } else if self.coverage < self.mean {
            DeltaClass::SignificantDecline
        } else {
            DeltaClass::SignificantIncrease
        }
    }

    /// Children missing a dose: the coverage shortfall applied to a
    /// birth cohort. Zero when coverage met or exceeded the forecast.
    pub fn missed_children(&self, birth_cohort: f64) -> f64 {
        (-self.delta).max(0.0) * birth_cohort
    }
}

/// Significance classification of a [`DeltaRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaClass {
    /// Reported coverage inside the forecast interval.
    Within,
    /// Outside the interval, below the expected value.
    SignificantDecline,
    /// Outside the interval, above the expected value.
    SignificantIncrease,
}

/// Join forecast records against reported coverage by (country, year).
///
/// A forecast year with no matching report, or a report with a missing
/// coverage value, is dropped from delta computation rather than treated
/// as zero. Drops are logged, never fatal.
pub fn compute_deltas(forecasts: &[ForecastRecord], table: &ObservationTable) -> Vec<DeltaRecord> {
    let mut deltas = Vec::with_capacity(forecasts.len());

    for record in forecasts {
        let observation = match table.get(&record.iso, record.year) {
            Some(observation) => observation,
            None => {
                warn!(
                    iso = %record.iso,
                    year = record.year,
                    "no reported coverage for forecast year, dropping record"
                );
                continue;
            }
        };
        let coverage = match observation.coverage {
            Some(coverage) => coverage,
            None => {
                warn!(
                    iso = %record.iso,
                    year = record.year,
                    "reported coverage missing for forecast year, dropping record"
                );
                continue;
            }
        };

        deltas.push(DeltaRecord {
            iso: record.iso.clone(),
            meta: observation.meta.clone(),
            year: record.year,
            method: record.method.clone(),
            level: record.level,
            mean: record.mean,
            lower: record.lower,
            upper: record.upper,
            coverage,
            delta: coverage - record.mean,
            lower_delta: coverage - record.lower,
            upper_delta: coverage - record.upper,
            within_interval: coverage >= record.lower && coverage <= record.upper,
            interval_width: record.upper - record.lower,
        });
    }

    deltas
}
