//! The prediction service: loads a published scaler and model and serves
//! `POST /predict`.

pub mod config;
pub mod error;
pub mod routes;
pub mod service;

pub use config::PredictorConfig;
pub use error::{ConfigErr, PredictErr};
pub use service::Predictor;
