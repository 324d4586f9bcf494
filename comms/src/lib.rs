//! The vocabulary shared by the predictor and the trainer: target labels,
//! the prediction feature schema and the JSON bodies of every endpoint.

pub mod features;
pub mod msg;
pub mod targets;

pub use features::{
    FEATURE_COLUMNS, FeatureSchema, FeatureVector, FieldRule, Presence, SchemaError,
};
pub use msg::{
    ErrorResponse, MessageResponse, PredictResponse, TrainRequest, VersionInfo, VersionsResponse,
};
pub use targets::{TARGET_COLUMNS, TargetLabel, UnknownTarget};
