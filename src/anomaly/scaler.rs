//! Per-feature min-max scaling

use crate::error::{EngineError, EngineResult};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

const LEN: usize = FeatureVector::LEN;

/// Maps each feature to `(x - min) / (max - min)` using the fitted range.
///
/// A feature with zero range is divided by 1. Values outside the fitted range
/// are not clipped, so a novel vector can land below 0 or above 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: [f64; LEN],
    scale: [f64; LEN],
}

impl MinMaxScaler {
    pub fn fit(vectors: &[FeatureVector]) -> EngineResult<Self> {
        if vectors.is_empty() {
            return Err(EngineError::InsufficientData {
                scope: "scaler fit".to_string(),
            });
        }

        let mut min = [f64::INFINITY; LEN];
        let mut max = [f64::NEG_INFINITY; LEN];
        for vector in vectors {
            for (k, value) in vector.to_array().into_iter().enumerate() {
                min[k] = min[k].min(value);
                max[k] = max[k].max(value);
            }
        }

        let mut scale = [1.0; LEN];
        for k in 0..LEN {
            let range = max[k] - min[k];
            if range > 0.0 {
                scale[k] = range;
            }
        }

        Ok(Self { min, scale })
    }

    pub fn transform(&self, vector: &FeatureVector) -> [f64; LEN] {
        let mut out = vector.to_array();
        for (k, value) in out.iter_mut().enumerate() {
            *value = (*value - self.min[k]) / self.scale[k];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(first: f64, second: f64) -> FeatureVector {
        let mut values = [7.0; LEN];
        values[0] = first;
        values[1] = second;
        FeatureVector::from_array(values)
    }

    #[test]
    fn test_fit_transform_range() {
        let scaler = MinMaxScaler::fit(&[vector(0.0, 10.0), vector(4.0, 20.0), vector(2.0, 15.0)]).unwrap();
        let scaled = scaler.transform(&vector(2.0, 15.0));
        assert!((scaled[0] - 0.5).abs() < 1e-12);
        assert!((scaled[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_constant_feature_maps_to_zero() {
        let scaler = MinMaxScaler::fit(&[vector(1.0, 1.0), vector(3.0, 1.0)]).unwrap();
        let scaled = scaler.transform(&vector(1.0, 1.0));
        assert_eq!(scaled[1], 0.0);
        // untouched constant columns
        assert_eq!(scaled[5], 0.0);
        // a shift on a constant column is not amplified
        assert_eq!(scaler.transform(&vector(1.0, 3.0))[1], 2.0);
    }

    #[test]
    fn test_out_of_range_is_not_clipped() {
        let scaler = MinMaxScaler::fit(&[vector(0.0, 0.0), vector(10.0, 0.0)]).unwrap();
        assert_eq!(scaler.transform(&vector(20.0, 0.0))[0], 2.0);
        assert_eq!(scaler.transform(&vector(-10.0, 0.0))[0], -1.0);
    }

    #[test]
    fn test_fit_requires_data() {
        assert!(MinMaxScaler::fit(&[]).is_err());
    }
}
