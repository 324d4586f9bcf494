//! The training service: fits the insulin model on uploaded rows and
//! publishes it as a new artifact version.

pub mod config;
pub mod error;
pub mod routes;
pub mod service;

pub use config::TrainerConfig;
pub use error::{ConfigErr, TrainErr};
pub use service::TrainingService;
