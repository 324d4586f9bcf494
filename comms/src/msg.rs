use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body returned when the training payload has no usable `features`.
pub const INVALID_DATA_FORMAT: &str = "Invalid data format";

/// Body returned when a training payload lacks a target column.
pub const MISSING_TARGET_COLUMNS: &str = "Missing one or more target columns in data";

/// Body returned after a successful training run.
pub const TRAINED_SUCCESSFULLY: &str = "Model trained successfully!";

/// A training request: one JSON object per dataset row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainRequest {
    pub features: Vec<Map<String, Value>>,
}

impl TrainRequest {
    /// Interprets a raw request body as a training request.
    ///
    /// # Returns
    /// `None` if the body is not an object whose `features` is an array of objects.
    pub fn from_body(body: Value) -> Option<Self> {
        serde_json::from_value(body).ok()
    }
}

/// The successful `/predict` response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: f64,
}

/// A plain message response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// A published model version as listed by the trainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub id: String,
    pub published_at_ms: u64,
}

/// The `/versions` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionsResponse {
    pub current: Option<String>,
    pub versions: Vec<VersionInfo>,
}
