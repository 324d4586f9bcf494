use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{MlError, Regressor, Result};

/// Fits one clone of a base regressor per target column.
///
/// `fit` replaces every fitted estimator, so a single instance can be refitted
/// in place as new data arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiOutputRegressor<R> {
    estimator: R,
    estimators: Vec<R>,
}

impl<R: Regressor + Clone> MultiOutputRegressor<R> {
    /// Creates a new `MultiOutputRegressor`.
    ///
    /// # Args
    /// * `estimator` - The unfitted template cloned for every target.
    pub fn new(estimator: R) -> Self {
        Self {
            estimator,
            estimators: Vec::new(),
        }
    }

    /// Fits one estimator per column of `y`.
    ///
    /// # Args
    /// * `x` - Feature matrix with one row per sample.
    /// * `y` - Target matrix with one row per sample and one column per output.
    ///
    /// # Errors
    /// Returns `MlError` if `y` has no columns, the row counts disagree or any
    /// estimator fails. On error the previous fit is kept.
    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView2<f64>) -> Result<()> {
        if y.ncols() == 0 {
            return Err(MlError::InvalidInput("at least one target column is required"));
        }
        if x.nrows() != y.nrows() {
            return Err(MlError::ShapeMismatch {
                what: "target rows",
                got: y.nrows(),
                expected: x.nrows(),
            });
        }

        let mut fitted = Vec::with_capacity(y.ncols());
        for (i, column) in y.axis_iter(Axis(1)).enumerate() {
            let mut estimator = self.estimator.clone();
            estimator.fit(x, column)?;
            log::debug!("fitted estimator for output {i}");
            fitted.push(estimator);
        }

        self.estimators = fitted;
        Ok(())
    }

    /// Predicts every output for every row of `x`.
    ///
    /// # Returns
    /// An `n_samples × n_outputs` matrix.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if self.estimators.is_empty() {
            return Err(MlError::NotFitted("multi output regressor"));
        }

        let mut out = Array2::zeros((x.nrows(), self.estimators.len()));
        for (estimator, mut column) in self.estimators.iter().zip(out.axis_iter_mut(Axis(1))) {
            column.assign(&estimator.predict(x)?);
        }

        Ok(out)
    }

    /// Returns the amount of outputs, 0 before fit.
    pub fn n_outputs(&self) -> usize {
        self.estimators.len()
    }

    pub fn n_features_in(&self) -> Option<usize> {
        self.estimators.first().and_then(|e| e.n_features_in())
    }

    pub fn is_fitted(&self) -> bool {
        !self.estimators.is_empty()
    }
}
