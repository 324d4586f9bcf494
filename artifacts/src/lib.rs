//! Versioned, atomically published model artifacts.
//!
//! The trainer stages a new version, writes its artifacts and commits it.
//! The predictor reads the current (or a pinned) version at startup.

mod error;
mod store;

pub use error::{Result, StoreErr};
pub use store::{ArtifactStore, Staging, Version};

/// Artifact name of the fitted feature scaler.
pub const SCALER: &str = "scaler";

/// Artifact name of the fitted regressor.
pub const MODEL: &str = "model";
