use std::{error::Error, fmt};

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use artifacts::StoreErr;
use comms::{ErrorResponse, msg};
use ml_core::MlError;

/// Failures of a training request.
#[derive(Debug)]
pub enum TrainErr {
    /// The body has no array of row objects under `features`.
    InvalidFormat,
    /// The rows lack the named target columns.
    MissingTargets(Vec<String>),
    Ml(MlError),
    Store(StoreErr),
    /// The blocking training task didn't run to completion.
    Interrupted(String),
}

impl fmt::Display for TrainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainErr::InvalidFormat => f.write_str(msg::INVALID_DATA_FORMAT),
            TrainErr::MissingTargets(_) => f.write_str(msg::MISSING_TARGET_COLUMNS),
            TrainErr::Ml(e) => write!(f, "{e}"),
            TrainErr::Store(e) => write!(f, "{e}"),
            TrainErr::Interrupted(e) => write!(f, "training was interrupted: {e}"),
        }
    }
}

impl Error for TrainErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainErr::Ml(e) => Some(e),
            TrainErr::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlError> for TrainErr {
    fn from(value: MlError) -> Self {
        Self::Ml(value)
    }
}

impl From<StoreErr> for TrainErr {
    fn from(value: StoreErr) -> Self {
        Self::Store(value)
    }
}

impl ResponseError for TrainErr {
    fn status_code(&self) -> StatusCode {
        match self {
            TrainErr::InvalidFormat | TrainErr::MissingTargets(_) => StatusCode::BAD_REQUEST,
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
