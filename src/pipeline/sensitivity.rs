//! Confidence-level sensitivity sweep.

use crate::config::AnalysisConfig;
use crate::core::observation::ObservationTable;
use crate::pipeline::delta::{compute_deltas, DeltaClass};
use crate::pipeline::{forecast_records, FittedCoverageModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Significance counts for one confidence level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    /// Confidence level the intervals were computed at.
    pub level: f64,
    /// Countries with a significant decline in any forecast year.
    pub count_decline: usize,
    /// Countries with a significant increase in any forecast year.
    pub count_increase: usize,
    /// Declines minus increases.
    pub signed_difference: i64,
    /// Share of modeled countries with any significant result.
    pub proportion_significant: f64,
    /// Distance between that share and the nominal miscoverage
    /// `1 - level`. Under the null of no systematic shift the two are
    /// close; a large gap indicates a real effect rather than noise.
    pub calibration_gap: f64,
}

/// Repeat forecast, normalization, and delta classification once per
/// configured confidence level.
///
/// Model selection does not depend on the confidence level, so the
/// already-fitted models are reused and only the interval computation
/// and downstream classification re-run per level.
pub fn sensitivity_sweep(
    models: &[FittedCoverageModel],
    table: &ObservationTable,
    config: &AnalysisConfig,
) -> Vec<SensitivityRow> {
    config
        .sweep_levels
        .iter()
        .map(|&level| sweep_level(models, table, config, level))
        .collect()
}

fn sweep_level(
    models: &[FittedCoverageModel],
    table: &ObservationTable,
    config: &AnalysisConfig,
    level: f64,
) -> SensitivityRow {
    let forecasts = forecast_records(models, config, level);
    let deltas = compute_deltas(&forecasts, table);

    let mut decline: BTreeSet<&str> = BTreeSet::new();
    let mut increase: BTreeSet<&str> = BTreeSet::new();
    for record in &deltas {
        match record.classify() {
            DeltaClass::SignificantDecline => {
                decline.insert(record.iso.as_str());
            }
            DeltaClass::SignificantIncrease => {
                increase.insert(record.iso.as_str());
            }
            DeltaClass::Within => {}
        }
    }

    let significant = decline.union(&increase).count();
    let total = models.len();
    let proportion_significant = if total == 0 {
        0.0
    } else {
        significant as f64 / total as f64
    };

    SensitivityRow {
        level,
        count_decline: decline.len(),
        count_increase: increase.len(),
        signed_difference: decline.len() as i64 - increase.len() as i64,
        proportion_significant,
        calibration_gap: (proportion_significant - (1.0 - level)).abs(),
    }
}
