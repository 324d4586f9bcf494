use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{MlError, Result};

/// Standardizes features by removing the mean and scaling to unit variance.
///
/// A `StandardScaler` only exists fitted: it is built by `fit` and is
/// immutable afterwards, so it can be shared read-only between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names_in: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fits a new `StandardScaler` on `x`.
    ///
    /// Uses the population standard deviation. Constant columns get a scale
    /// of 1 so they are only centered.
    ///
    /// # Args
    /// * `x` - Feature matrix with one row per sample.
    /// * `feature_names` - One name per column of `x`.
    ///
    /// # Returns
    /// The fitted scaler, or an `MlError` if `x` is empty or the names don't match its width.
    pub fn fit(x: ArrayView2<f64>, feature_names: Vec<String>) -> Result<Self> {
        let (rows, cols) = x.dim();

        if rows == 0 {
            return Err(MlError::InvalidInput("cannot fit a scaler on zero samples"));
        }
        if feature_names.len() != cols {
            return Err(MlError::ShapeMismatch {
                what: "feature names",
                got: feature_names.len(),
                expected: cols,
            });
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or(MlError::InvalidInput("cannot fit a scaler on zero samples"))?;

        let scale = x
            .std_axis(Axis(0), 0.0)
            .iter()
            .map(|&std| if std > f64::EPSILON * 10.0 { std } else { 1.0 })
            .collect();

        Ok(Self {
            feature_names_in: feature_names,
            mean: mean.to_vec(),
            scale,
        })
    }

    /// Applies the fitted standardization to `x`.
    ///
    /// # Returns
    /// A new scaled matrix, or `MlError::ShapeMismatch` if the width of `x`
    /// is not `n_features_in`.
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features_in() {
            return Err(MlError::ShapeMismatch {
                what: "scaler features",
                got: x.ncols(),
                expected: self.n_features_in(),
            });
        }

        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            for ((v, mean), scale) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
                *v = (*v - mean) / scale;
            }
        }

        Ok(out)
    }

    /// Returns the number of features seen during fit.
    pub fn n_features_in(&self) -> usize {
        self.mean.len()
    }

    /// Returns the feature names seen during fit, in column order.
    pub fn feature_names_in(&self) -> &[String] {
        &self.feature_names_in
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}
