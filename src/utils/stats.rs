//! Statistical helpers shared across the pipeline.

use statrs::distribution::{ContinuousCDF, Normal};

/// Mean of a slice. NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n-1 denominator). NaN for fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Whether every value equals the first one exactly.
pub fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(&first) => values.iter().all(|&v| v == first),
        None => true,
    }
}

/// Two-sided z-score for a confidence level, e.g. 0.95 -> ~1.96.
pub fn interval_z(level: f64) -> f64 {
    let normal = Normal::new(0.0, 1.0).unwrap();
    normal.inverse_cdf((1.0 + level) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(variance(&values), 32.0 / 7.0, epsilon = 1e-12);
        assert_relative_eq!(std_dev(&values), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn mean_of_empty_is_nan() {
        assert!(mean(&[]).is_nan());
        assert!(variance(&[1.0]).is_nan());
    }

    #[test]
    fn constant_detection() {
        assert!(is_constant(&[0.95, 0.95, 0.95]));
        assert!(is_constant(&[]));
        assert!(!is_constant(&[0.95, 0.94]));
    }

    #[test]
    fn z_scores_match_known_quantiles() {
        assert_relative_eq!(interval_z(0.95), 1.959964, epsilon = 1e-4);
        assert_relative_eq!(interval_z(0.80), 1.281552, epsilon = 1e-4);
        assert_relative_eq!(interval_z(0.99), 2.575829, epsilon = 1e-4);
    }

    #[test]
    fn z_scores_increase_with_level() {
        assert!(interval_z(0.99) > interval_z(0.95));
        assert!(interval_z(0.95) > interval_z(0.80));
        assert!(interval_z(0.80) > interval_z(0.30));
    }
}
