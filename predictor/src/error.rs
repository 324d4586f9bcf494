use std::{error::Error, fmt};

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use artifacts::StoreErr;
use comms::{ErrorResponse, SchemaError};
use ml_core::MlError;

/// Failures while loading the model or serving a prediction.
#[derive(Debug)]
pub enum PredictErr {
    Schema(SchemaError),
    FeatureCount { got: usize, expected: usize },
    TargetOutOfRange { index: usize, outputs: usize },
    Model(MlError),
    Store(StoreErr),
}

impl fmt::Display for PredictErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictErr::Schema(e) => write!(f, "{e}"),
            PredictErr::FeatureCount { got, expected } => write!(
                f,
                "wrong number of features: got {got}, the scaler expects {expected}"
            ),
            PredictErr::TargetOutOfRange { index, outputs } => write!(
                f,
                "target index {index} is out of range for a model with {outputs} outputs"
            ),
            PredictErr::Model(e) => write!(f, "{e}"),
            PredictErr::Store(e) => write!(f, "{e}"),
        }
    }
}

impl Error for PredictErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PredictErr::Schema(e) => Some(e),
            PredictErr::Model(e) => Some(e),
            PredictErr::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SchemaError> for PredictErr {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<MlError> for PredictErr {
    fn from(value: MlError) -> Self {
        Self::Model(value)
    }
}

impl From<StoreErr> for PredictErr {
    fn from(value: StoreErr) -> Self {
        Self::Store(value)
    }
}

impl ResponseError for PredictErr {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictErr::Schema(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}

/// An environment variable holding an unusable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErr {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}='{}': {}", self.var, self.value, self.reason)
    }
}

impl Error for ConfigErr {}
