use artifacts::{ArtifactStore, Version};
use comms::{TARGET_COLUMNS, TrainRequest, VersionInfo, VersionsResponse};
use ml_core::{Frame, InsulinModel, StandardScaler};
use parking_lot::Mutex;
use serde_json::Value;

use crate::TrainErr;

/// Owns the shared regressor and publishes every successful fit.
///
/// Requests are serialized by the model lock, which stays held until the
/// fitted model has been published and old versions pruned.
#[derive(Debug)]
pub struct TrainingService {
    model: Mutex<InsulinModel>,
    store: ArtifactStore,
    keep_versions: Option<usize>,
}

impl TrainingService {
    /// Creates a new `TrainingService`.
    ///
    /// # Args
    /// * `model` - The regressor refitted by every request.
    /// * `store` - Where fitted versions are published.
    pub fn new(model: InsulinModel, store: ArtifactStore) -> Self {
        Self {
            model: Mutex::new(model),
            store,
            keep_versions: None,
        }
    }

    /// Prunes old versions after each publish, keeping at most `keep`.
    pub fn with_keep_versions(mut self, keep: Option<usize>) -> Self {
        self.keep_versions = keep;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Fits the scaler and model on a training body and publishes them.
    ///
    /// # Args
    /// * `body` - A JSON object with the dataset rows under `features`.
    ///
    /// # Returns
    /// The newly published version.
    ///
    /// # Errors
    /// * `TrainErr::InvalidFormat` if `features` isn't an array of objects.
    /// * `TrainErr::MissingTargets` if any target column is absent.
    /// * `TrainErr::Ml` if a cell isn't numeric or the data can't be fitted.
    /// * `TrainErr::Store` if the fitted artifacts can't be published.
    pub fn train(&self, body: Value) -> Result<Version, TrainErr> {
        let request = TrainRequest::from_body(body).ok_or(TrainErr::InvalidFormat)?;
        let frame = Frame::from_records(request.features);

        let missing = frame.missing_columns(&TARGET_COLUMNS);
        if !missing.is_empty() {
            return Err(TrainErr::MissingTargets(missing));
        }

        let inputs = frame.columns_except(&TARGET_COLUMNS);
        let x = frame.to_matrix(&inputs)?;
        let y = frame.to_matrix(&TARGET_COLUMNS)?;

        log::info!(
            "training on {} rows with {} columns, {} of them inputs",
            frame.len(),
            frame.columns().len(),
            inputs.len()
        );
        log::debug!("input columns: {inputs:?}");

        let scaler = StandardScaler::fit(x.view(), inputs)?;
        let scaled = scaler.transform(x.view())?;

        let mut model = self.model.lock();
        model.fit(scaled.view(), y.view())?;

        let staging = self.store.stage()?;
        staging.write(artifacts::SCALER, &scaler)?;
        staging.write(artifacts::MODEL, &*model)?;
        let version = staging.commit()?;

        if let Some(keep) = self.keep_versions {
            // the new version is already live, a failed cleanup only leaks disk
            if let Err(e) = self.store.prune(keep) {
                log::warn!("failed to prune old model versions: {e}");
            }
        }
        drop(model);

        Ok(version)
    }

    /// Lists the published versions, oldest first, and the active one.
    pub fn versions(&self) -> Result<VersionsResponse, TrainErr> {
        let current = self.store.current()?;
        let versions = self
            .store
            .versions()?
            .into_iter()
            .map(|version| VersionInfo {
                id: version.id().to_string(),
                published_at_ms: version.published_at_ms(),
            })
            .collect();

        Ok(VersionsResponse {
            current: current.map(|version| version.id().to_string()),
            versions,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use ml_core::{MultiOutputRegressor, RandomForestRegressor};
    use serde_json::{Map, json};
    use tempfile::tempdir;

    use super::*;

    fn rows(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                let mut row = Map::new();
                row.insert("ID".into(), json!(i));
                row.insert("Glucosio alle 09:30".into(), json!(100 + i * 3));
                for (k, target) in TARGET_COLUMNS.iter().enumerate() {
                    row.insert(target.to_string(), json!((i % 4 + k) as f64));
                }
                Value::Object(row)
            })
            .collect()
    }

    fn service(dir: &std::path::Path) -> TrainingService {
        let forest =
            RandomForestRegressor::new(NonZeroUsize::new(4).unwrap()).with_random_state(Some(42));
        let store = ArtifactStore::open(dir).unwrap();
        TrainingService::new(MultiOutputRegressor::new(forest), store)
    }

    #[test]
    fn publishes_scaler_and_model_together() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());

        let version = service.train(json!({ "features": rows(10) })).unwrap();
        assert_eq!(service.store().current().unwrap(), Some(version.clone()));

        let scaler: StandardScaler = service.store().load(&version, artifacts::SCALER).unwrap();
        assert_eq!(scaler.feature_names_in(), ["ID", "Glucosio alle 09:30"]);

        let model: InsulinModel = service.store().load(&version, artifacts::MODEL).unwrap();
        assert_eq!(model.n_outputs(), 6);
        assert_eq!(model.n_features_in(), Some(2));
    }

    #[test]
    fn rejects_bodies_without_rows() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());

        for body in [
            json!({}),
            json!({ "features": "rows" }),
            json!({ "features": { "ID": [1, 2] } }),
            json!([]),
        ] {
            assert!(matches!(
                service.train(body),
                Err(TrainErr::InvalidFormat)
            ));
        }
        assert!(service.store().versions().unwrap().is_empty());
    }

    #[test]
    fn reports_missing_targets() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());

        let mut rows = rows(5);
        for row in &mut rows {
            row.as_object_mut().unwrap().remove("Insulina alle 23:00");
        }

        let Err(TrainErr::MissingTargets(missing)) = service.train(json!({ "features": rows }))
        else {
            panic!("expected missing targets");
        };
        assert_eq!(missing, ["Insulina alle 23:00"]);
    }

    #[test]
    fn failed_fits_publish_nothing() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());

        let mut rows = rows(5);
        rows[2]["ID"] = json!("seven");

        assert!(matches!(
            service.train(json!({ "features": rows })),
            Err(TrainErr::Ml(_))
        ));
        assert_eq!(service.store().current().unwrap(), None);
    }

    #[test]
    fn keeps_only_the_configured_number_of_versions() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).with_keep_versions(Some(2));

        let mut last = None;
        for _ in 0..3 {
            std::thread::sleep(std::time::Duration::from_millis(2));
            last = Some(service.train(json!({ "features": rows(6) })).unwrap());
        }

        let listing = service.versions().unwrap();
        assert_eq!(listing.versions.len(), 2);
        assert_eq!(listing.current.as_deref(), last.as_ref().map(Version::id));
    }
}
