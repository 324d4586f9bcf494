use std::fmt;

/// The result type used across the `ml_core` crate.
pub type Result<T> = std::result::Result<T, MlError>;

/// Errors produced while fitting or evaluating estimators.
#[derive(Debug, Clone, PartialEq)]
pub enum MlError {
    /// An input is invalid for semantic or domain reasons.
    InvalidInput(&'static str),

    /// A shape invariant was violated (e.g. mismatched lengths).
    ShapeMismatch {
        /// Human-readable context for the mismatch (e.g. "features", "targets").
        what: &'static str,
        /// Observed value.
        got: usize,
        /// Expected value.
        expected: usize,
    },

    /// An estimator was used before being fitted.
    NotFitted(&'static str),

    /// A cell required to build a numeric matrix is absent or null.
    MissingValue { column: String, row: usize },

    /// A cell could not be converted into a number.
    NonNumeric { column: String, row: usize },
}

impl fmt::Display for MlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            MlError::ShapeMismatch { what, got, expected } => {
                write!(f, "shape mismatch for {what}: got {got}, expected {expected}")
            }
            MlError::NotFitted(what) => write!(f, "{what} is not fitted yet"),
            MlError::MissingValue { column, row } => {
                write!(f, "missing value in column '{column}' at row {row}")
            }
            MlError::NonNumeric { column, row } => {
                write!(f, "non numeric value in column '{column}' at row {row}")
            }
        }
    }
}

impl std::error::Error for MlError {}

impl From<ndarray::ShapeError> for MlError {
    fn from(_: ndarray::ShapeError) -> Self {
        MlError::InvalidInput("matrix buffer does not match the requested shape")
    }
}
