//! Numeric primitives

use serde::{Deserialize, Serialize};

/// Mean and sample variance (N-1 denominator).
///
/// Empty input yields `(0, 0)`; a single sample yields `(x, 0)`.
pub fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }
    let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    (mean, (sum_sq / (n - 1) as f64).max(0.0))
}

/// Round to `digits` decimals, ties to even.
///
/// Rounds the exact binary value of `value`, not a scaled copy of it: 0.45 is
/// stored as 0.45000000000000001 and rounds up to 0.5, while 0.35 is stored as
/// 0.34999999999999998 and rounds down to 0.3. Only values that are exactly
/// halfway (0.5, 0.25) go to the even neighbour.
pub fn round_half_even(value: f64, digits: i32) -> f64 {
    if digits <= 0 || !value.is_finite() {
        return value.round_ties_even();
    }
    // std float formatting is correctly rounded on the exact value
    format!("{:.*}", digits as usize, value)
        .parse()
        .unwrap_or(value)
}

/// Ratio of `part` to `whole`, `None` when `whole` is zero.
pub fn ratio(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64)
    }
}

/// Mean, variance, min and max of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let (mean, variance) = mean_and_variance(values);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self { mean, variance, min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance_degenerate_inputs() {
        assert_eq!(mean_and_variance(&[]), (0.0, 0.0));
        assert_eq!(mean_and_variance(&[7.5]), (7.5, 0.0));
    }

    #[test]
    fn test_sample_variance() {
        let (mean, var) = mean_and_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((var - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_variance_is_order_independent_and_non_negative() {
        let a = mean_and_variance(&[1.0, 10.0, 3.0, 3.0]);
        let b = mean_and_variance(&[3.0, 3.0, 10.0, 1.0]);
        assert!((a.1 - b.1).abs() < 1e-12);
        assert!(a.1 >= 0.0);
        assert_eq!(mean_and_variance(&[4.0, 4.0, 4.0]).1, 0.0);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(0.5, 0), 0.0);
        assert_eq!(round_half_even(0.6, 0), 1.0);
        assert_eq!(round_half_even(1.5, 0), 2.0);
        assert_eq!(round_half_even(0.25, 1), 0.2);
        assert_eq!(round_half_even(0.333, 2), 0.33);
    }

    #[test]
    fn test_round_uses_exact_binary_value() {
        assert_eq!(round_half_even(9.0 / 20.0, 1), 0.5);
        assert_eq!(round_half_even(7.0 / 20.0, 1), 0.3);
        assert_eq!(round_half_even(3.0 / 40.0, 2), 0.07);
        assert_eq!(round_half_even(2.0 / 6.0, 1), 0.3);
        assert_eq!(round_half_even(5.0 / 6.0, 1), 0.8);
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(1, 0), None);
        assert_eq!(ratio(1, 4), Some(0.25));
    }

    #[test]
    fn test_summary() {
        let s = Summary::from_values(&[3.0, 1.0, 2.0]);
        assert_eq!((s.min, s.max, s.mean), (1.0, 3.0, 2.0));
        assert_eq!(Summary::from_values(&[]), Summary::default());
    }
}
