use artifacts::{ArtifactStore, StoreErr, Version};
use comms::{FeatureSchema, TargetLabel};
use ml_core::{InsulinModel, MlError, StandardScaler};
use ndarray::Array2;
use serde_json::Value;

use crate::PredictErr;

/// A loaded scaler and model pair answering single row predictions.
///
/// It's immutable once built and shared by every HTTP worker.
#[derive(Debug)]
pub struct Predictor {
    scaler: StandardScaler,
    model: InsulinModel,
    schema: FeatureSchema,
    target: TargetLabel,
    version: Option<Version>,
}

impl Predictor {
    /// Creates a new `Predictor` from already fitted parts.
    ///
    /// # Args
    /// * `scaler` - The scaler applied to every feature vector.
    /// * `model` - The fitted multi output regressor.
    /// * `schema` - Builds feature vectors out of request bodies.
    /// * `target` - The model output returned to callers.
    ///
    /// # Errors
    /// `MlError::NotFitted` if `model` has never been fitted.
    pub fn new(
        scaler: StandardScaler,
        model: InsulinModel,
        schema: FeatureSchema,
        target: TargetLabel,
    ) -> Result<Self, PredictErr> {
        if !model.is_fitted() {
            return Err(MlError::NotFitted("insulin model").into());
        }

        if !scaler.feature_names_in().iter().eq(schema.names()) {
            log::warn!(
                "scaler was fitted on {:?}, requests are read as {:?}",
                scaler.feature_names_in(),
                schema.names().collect::<Vec<_>>()
            );
        }

        Ok(Self {
            scaler,
            model,
            schema,
            target,
            version: None,
        })
    }

    /// Loads the scaler and model of a published version.
    ///
    /// # Args
    /// * `store` - The artifact store written by the trainer.
    /// * `version` - A pinned version id, or `None` for the current one.
    /// * `schema` - Builds feature vectors out of request bodies.
    /// * `target` - The model output returned to callers.
    ///
    /// # Errors
    /// `StoreErr::NoCurrentVersion` when nothing was published yet, or any
    /// failure reading the artifacts.
    pub fn load(
        store: &ArtifactStore,
        version: Option<&str>,
        schema: FeatureSchema,
        target: TargetLabel,
    ) -> Result<Self, PredictErr> {
        let version = match version {
            Some(id) => store.version(id)?,
            None => store.current()?.ok_or(StoreErr::NoCurrentVersion)?,
        };

        log::info!("loading model and scaler from version {version}");
        let scaler: StandardScaler = store.load(&version, artifacts::SCALER)?;
        let model: InsulinModel = store.load(&version, artifacts::MODEL)?;

        let mut predictor = Self::new(scaler, model, schema, target)?;
        predictor.version = Some(version);

        log::info!(
            "model loaded: {} features in, {} outputs, serving '{}'",
            predictor.scaler.n_features_in(),
            predictor.model.n_outputs(),
            predictor.target
        );
        Ok(predictor)
    }

    /// The version this predictor was loaded from, if any.
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn target(&self) -> TargetLabel {
        self.target
    }

    /// Predicts the configured target for a single request body.
    ///
    /// # Args
    /// * `body` - The request's JSON object.
    ///
    /// # Returns
    /// The predicted dose of the configured target.
    ///
    /// # Errors
    /// * `PredictErr::Schema` if the body doesn't satisfy the feature schema.
    /// * `PredictErr::FeatureCount` if the scaler expects another width.
    /// * `PredictErr::TargetOutOfRange` if the model has too few outputs.
    pub fn predict(&self, body: &Value) -> Result<f64, PredictErr> {
        let features = self.schema.extract(body)?;
        log::debug!("features: {:?}", features.as_slice());

        let expected = self.scaler.n_features_in();
        if features.len() != expected {
            return Err(PredictErr::FeatureCount {
                got: features.len(),
                expected,
            });
        }

        let x = Array2::from_shape_vec((1, expected), features.into_vec()).map_err(MlError::from)?;
        let scaled = self.scaler.transform(x.view())?;
        log::debug!("scaled features: {scaled}");

        let predictions = self.model.predict(scaled.view())?;
        log::debug!("predictions: {predictions}");

        let index = self.target.index();
        let prediction = predictions
            .get((0, index))
            .copied()
            .ok_or(PredictErr::TargetOutOfRange {
                index,
                outputs: predictions.ncols(),
            })?;

        log::debug!("prediction for '{}': {prediction}", self.target);
        Ok(prediction)
    }
}
