//! Stationarity testing for annual coverage series.
//!
//! The differencing order of each country's ARIMA model is chosen with
//! the KPSS test: the null hypothesis is level stationarity, so a large
//! statistic argues for differencing.

/// Result of a stationarity test.
#[derive(Debug, Clone)]
pub struct StationarityResult {
    /// Test statistic.
    pub statistic: f64,
    /// Approximate p-value.
    pub p_value: f64,
    /// Number of lags used for the long-run variance.
    pub lags: usize,
    /// Whether the series is judged stationary at 5% significance.
    pub is_stationary: bool,
    /// Critical values at common significance levels.
    pub critical_values: CriticalValues,
}

/// Critical values for the KPSS level-stationarity test.
#[derive(Debug, Clone)]
pub struct CriticalValues {
    /// Critical value at 1% significance.
    pub cv_1pct: f64,
    /// Critical value at 5% significance.
    pub cv_5pct: f64,
    /// Critical value at 10% significance.
    pub cv_10pct: f64,
}

impl Default for CriticalValues {
    fn default() -> Self {
        Self {
            cv_1pct: 0.739,
            cv_5pct: 0.463,
            cv_10pct: 0.347,
        }
    }
}

/// KPSS test for level stationarity.
///
/// Tests the null hypothesis that the series is stationary around a
/// constant level. Rejection (large statistic) implies non-stationarity.
///
/// # Arguments
/// * `series` - Time series data
/// * `lags` - Lags for the HAC variance (default: `4 * (n/100)^0.25`)
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> StationarityResult {
    let n = series.len();

    if n < 4 {
        return StationarityResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            is_stationary: false,
            critical_values: CriticalValues::default(),
        };
    }

    let lags = lags.unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize);
    let lags = lags.min(n / 2).max(1);

    // Demean for level stationarity.
    let mean: f64 = series.iter().sum::<f64>() / n as f64;
    let residuals: Vec<f64> = series.iter().map(|&x| x - mean).collect();

    // Partial sums of the residuals.
    let mut cumsum = vec![0.0; n];
    cumsum[0] = residuals[0];
    for i in 1..n {
        cumsum[i] = cumsum[i - 1] + residuals[i];
    }

    let numerator: f64 = cumsum.iter().map(|&s| s * s).sum::<f64>() / (n * n) as f64;

    // HAC long-run variance with a Bartlett kernel.
    let mut variance = residuals.iter().map(|&r| r * r).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let autocovar: f64 = residuals
            .iter()
            .skip(j)
            .zip(residuals.iter())
            .map(|(&a, &b)| a * b)
            .sum::<f64>()
            / n as f64;
        variance += 2.0 * weight * autocovar;
    }

    let critical_values = CriticalValues::default();

    if variance <= 0.0 {
        // Degenerate series: the null of stationarity trivially holds.
        return StationarityResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags,
            is_stationary: true,
            critical_values,
        };
    }

    let statistic = numerator / variance;
    let p_value = kpss_p_value(statistic);
    let is_stationary = statistic < critical_values.cv_5pct;

    StationarityResult {
        statistic,
        p_value,
        lags,
        is_stationary,
        critical_values,
    }
}

/// Approximate p-value by interpolating between tabulated critical values.
fn kpss_p_value(statistic: f64) -> f64 {
    if statistic.is_nan() {
        return f64::NAN;
    }

    if statistic < 0.347 {
        0.10 + 0.90 * (1.0 - statistic / 0.347)
    } else if statistic < 0.463 {
        0.05 + 0.05 * (0.463 - statistic) / (0.463 - 0.347)
    } else if statistic < 0.739 {
        0.01 + 0.04 * (0.739 - statistic) / (0.739 - 0.463)
    } else {
        0.01 * (1.0 - (statistic - 0.739).min(1.0))
    }
}
