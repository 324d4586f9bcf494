use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::Result;

/// A single-output regression estimator.
///
/// A `Regressor` learns a mapping from a feature matrix to one target column.
/// It does not:
/// - scale its inputs,
/// - know column names,
/// - persist itself.
pub trait Regressor: Send + Sync {
    /// Fits the estimator in place, discarding any previous fit.
    ///
    /// # Args
    /// * `x` - Feature matrix with one row per sample.
    /// * `y` - Target values, one per row of `x`.
    ///
    /// # Errors
    /// Returns `MlError` if the shapes disagree or the data is empty.
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()>;

    /// Predicts one value per row of `x`.
    ///
    /// # Errors
    /// Returns `MlError::NotFitted` before `fit` succeeded and
    /// `MlError::ShapeMismatch` if the feature width differs from the fitted one.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>>;

    /// Returns the feature width seen during fit, if fitted.
    fn n_features_in(&self) -> Option<usize>;
}
