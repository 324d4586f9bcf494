mod data;
mod error;
mod forest;
mod model;
mod multi_output;
mod scaler;
mod tree;

pub use data::Frame;
pub use error::{MlError, Result};
pub use forest::RandomForestRegressor;
pub use model::Regressor;
pub use multi_output::MultiOutputRegressor;
pub use scaler::StandardScaler;
pub use tree::DecisionTreeRegressor;

/// The estimator served by the predictor and fitted by the trainer.
pub type InsulinModel = MultiOutputRegressor<RandomForestRegressor>;
