//! Differencing utilities for ARIMA models.

/// Apply `d` rounds of first differencing to a series.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || series.is_empty() {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Integrate (reverse differencing) a forecast made on the differenced
/// scale back onto the original scale.
///
/// `original` is the training series the differencing was derived from;
/// its trailing values seed the cumulative sums.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let seed = if level == 0 {
            original.last().copied().unwrap_or(0.0)
        } else {
            difference(original, level).last().copied().unwrap_or(0.0)
        };

        let mut cumsum = seed;
        for value in &mut result {
            cumsum += *value;
            *value = cumsum;
        }
    }

    result
}
