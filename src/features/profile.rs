//! Population-wide standardization profile.
//!
//! The per-column standardization fit used to be implicit state baked into
//! the stored vectors. Here it is an explicit, versioned object persisted
//! alongside the index (see `db::profile`), so a re-fit is an auditable
//! operation and vectors standardized under different profiles can never be
//! silently mixed.

use tracing::info;

use super::{SCHEMA_VERSION, TARGET_FEATURES};
use crate::error::{EngineError, EngineResult};

/// Per-column mean and scale fitted over the full current population.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationProfile {
    /// Database row id once persisted; 0 for a freshly fitted profile.
    pub version: i64,
    /// Feature schema the profile was fitted under.
    pub schema_version: i64,
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl NormalizationProfile {
    pub fn dim(&self) -> usize {
        self.means.len()
    }

    /// Fit zero-mean / unit-variance columns over an N x D matrix of raw
    /// feature vectors. This is a batch operation over the whole population,
    /// never incremental.
    ///
    /// Columns with no variance get scale 1.0 so applying the profile never
    /// divides by zero.
    pub fn fit(matrix: &[Vec<f32>]) -> EngineResult<Self> {
        let Some(first) = matrix.first() else {
            return Err(EngineError::SchemaMismatch(
                "cannot fit a normalization profile over an empty population".to_string(),
            ));
        };
        let dim = first.len();
        if let Some(bad) = matrix.iter().find(|row| row.len() != dim) {
            return Err(EngineError::SchemaMismatch(format!(
                "vector dimensionality drift within population: {} vs {}",
                bad.len(),
                dim
            )));
        }

        let n = matrix.len() as f64;
        let mut means = vec![0.0f64; dim];
        for row in matrix {
            for (m, &v) in means.iter_mut().zip(row.iter()) {
                *m += v as f64;
            }
        }
        for m in means.iter_mut() {
            *m /= n;
        }

        // Population variance, not the sample estimator.
        let mut scales = vec![0.0f64; dim];
        for row in matrix {
            for ((s, m), &v) in scales.iter_mut().zip(means.iter()).zip(row.iter()) {
                let d = v as f64 - m;
                *s += d * d;
            }
        }
        for s in scales.iter_mut() {
            *s = (*s / n).sqrt();
            if *s < 1e-12 {
                *s = 1.0;
            }
        }

        info!(
            target: TARGET_FEATURES,
            "Fitted normalization profile over {} players, {} columns",
            matrix.len(),
            dim
        );

        Ok(Self {
            version: 0,
            schema_version: SCHEMA_VERSION,
            means,
            scales,
        })
    }

    /// Standardize one raw feature vector under this profile.
    pub fn apply(&self, raw: &[f32]) -> EngineResult<Vec<f32>> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(EngineError::SchemaMismatch(format!(
                "profile v{} was fitted under feature schema {}, current schema is {}",
                self.version, self.schema_version, SCHEMA_VERSION
            )));
        }
        if raw.len() != self.dim() {
            return Err(EngineError::SchemaMismatch(format!(
                "vector has {} coordinates, profile expects {}",
                raw.len(),
                self.dim()
            )));
        }
        Ok(raw
            .iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(&v, (m, s))| ((v as f64 - m) / s) as f32)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> Vec<Vec<f32>> {
        vec![
            vec![10.0, 5.0, 1.0],
            vec![20.0, 5.0, 3.0],
            vec![30.0, 5.0, 5.0],
        ]
    }

    #[test]
    fn fit_is_deterministic() {
        let a = NormalizationProfile::fit(&sample_matrix()).unwrap();
        let b = NormalizationProfile::fit(&sample_matrix()).unwrap();
        assert_eq!(a, b);

        let row = vec![12.5, 5.0, 4.0];
        assert_eq!(a.apply(&row).unwrap(), b.apply(&row).unwrap());
    }

    #[test]
    fn constant_column_gets_unit_scale() {
        let profile = NormalizationProfile::fit(&sample_matrix()).unwrap();
        assert_eq!(profile.scales[1], 1.0);
        // Constant column standardizes to exactly zero rather than NaN.
        let out = profile.apply(&[20.0, 5.0, 3.0]).unwrap();
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn columns_are_centered_and_scaled() {
        let matrix = sample_matrix();
        let profile = NormalizationProfile::fit(&matrix).unwrap();

        let standardized: Vec<Vec<f32>> = matrix
            .iter()
            .map(|row| profile.apply(row).unwrap())
            .collect();

        // Column 0 mean ~0 after standardization.
        let mean: f32 = standardized.iter().map(|r| r[0]).sum::<f32>() / 3.0;
        assert!(mean.abs() < 1e-6);

        // Column 0 variance ~1.
        let var: f32 = standardized.iter().map(|r| r[0] * r[0]).sum::<f32>() / 3.0;
        assert!((var - 1.0).abs() < 1e-5);
    }

    #[test]
    fn dimension_drift_is_a_schema_mismatch() {
        let profile = NormalizationProfile::fit(&sample_matrix()).unwrap();
        assert!(matches!(
            profile.apply(&[1.0, 2.0]),
            Err(crate::error::EngineError::SchemaMismatch(_))
        ));

        let ragged = vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]];
        assert!(matches!(
            NormalizationProfile::fit(&ragged),
            Err(crate::error::EngineError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn empty_population_is_rejected() {
        assert!(NormalizationProfile::fit(&[]).is_err());
    }
}
