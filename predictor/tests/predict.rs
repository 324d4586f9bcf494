use std::num::NonZeroUsize;

use actix_web::{
    App,
    http::{Method, StatusCode, header},
    test, web,
};
use artifacts::ArtifactStore;
use comms::{FEATURE_COLUMNS, FeatureSchema, TargetLabel};
use ml_core::{InsulinModel, MultiOutputRegressor, RandomForestRegressor, StandardScaler};
use ndarray::Array2;
use serde_json::{Value, json};
use tempfile::TempDir;

use predictor::{PredictErr, Predictor, routes};

/// Publishes a small fitted scaler and model with `width` input features.
fn publish(width: usize) -> (TempDir, ArtifactStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();

    let x = Array2::from_shape_fn((20, width), |(i, j)| ((i * 7 + j * 3) % 11) as f64 + i as f64);
    let y = Array2::from_shape_fn((20, 6), |(i, k)| (i % 5) as f64 + k as f64 * 0.5);

    let names = (0..width)
        .map(|j| {
            FEATURE_COLUMNS
                .get(j)
                .map_or_else(|| format!("extra {j}"), |name| name.to_string())
        })
        .collect();
    let scaler = StandardScaler::fit(x.view(), names).unwrap();
    let scaled = scaler.transform(x.view()).unwrap();

    let forest =
        RandomForestRegressor::new(NonZeroUsize::new(10).unwrap()).with_random_state(Some(42));
    let mut model: InsulinModel = MultiOutputRegressor::new(forest);
    model.fit(scaled.view(), y.view()).unwrap();

    let staging = store.stage().unwrap();
    staging.write(artifacts::SCALER, &scaler).unwrap();
    staging.write(artifacts::MODEL, &model).unwrap();
    staging.commit().unwrap();

    (dir, store)
}

fn scenario() -> Value {
    json!({
        "ID": 1,
        "settimana": 2,
        "giornoSettimana": 3,
        "Glucosio al Risveglio (07:00)": 110,
        "Glucosio alle 09:30": 130,
        "Glucosio alle 13:00": 140,
        "Glucosio alle 15:00": 125,
        "Glucosio alle 18:00": 135,
        "Glucosio alle 20:00": 120
    })
}

macro_rules! app {
    ($predictor:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($predictor))
                .configure(routes::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn scenario_returns_a_numeric_prediction() {
    let (_dir, store) = publish(9);
    let predictor =
        Predictor::load(&store, None, FeatureSchema::lenient(), TargetLabel::Waking).unwrap();
    let app = app!(predictor);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(scenario())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let prediction = body["prediction"].as_f64().unwrap();
    assert!(prediction.is_finite());
    // leaf values are training targets of the first output
    assert!((0.0..=4.0).contains(&prediction));
}

#[actix_web::test]
async fn empty_object_predicts_with_zero_filled_features() {
    let (_dir, store) = publish(9);
    let predictor =
        Predictor::load(&store, None, FeatureSchema::lenient(), TargetLabel::Waking).unwrap();
    let app = app!(predictor);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["prediction"].is_number());
}

#[actix_web::test]
async fn non_numeric_fields_are_bad_requests() {
    let (_dir, store) = publish(9);
    let predictor =
        Predictor::load(&store, None, FeatureSchema::lenient(), TargetLabel::Waking).unwrap();
    let app = app!(predictor);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({ "Glucosio alle 09:30": "high" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("Glucosio alle 09:30"));
}

#[actix_web::test]
async fn boolean_fields_are_read_as_numbers() {
    let (_dir, store) = publish(9);
    let predictor =
        Predictor::load(&store, None, FeatureSchema::lenient(), TargetLabel::Waking).unwrap();
    let app = app!(predictor);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({ "ID": true, "settimana": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["prediction"].is_number());
}

#[actix_web::test]
async fn strict_schema_rejects_missing_fields() {
    let (_dir, store) = publish(9);
    let predictor =
        Predictor::load(&store, None, FeatureSchema::strict(), TargetLabel::Waking).unwrap();
    let app = app!(predictor);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({ "ID": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(scenario())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let (_dir, store) = publish(9);
    let predictor =
        Predictor::load(&store, None, FeatureSchema::lenient(), TargetLabel::Waking).unwrap();
    let app = app!(predictor);

    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"ID\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn scaler_width_mismatch_is_an_internal_error() {
    let (_dir, store) = publish(10);
    let predictor =
        Predictor::load(&store, None, FeatureSchema::lenient(), TargetLabel::Waking).unwrap();
    let app = app!(predictor);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(scenario())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("expects 10"));
}

#[actix_web::test]
async fn configured_target_selects_another_output() {
    let (_dir, store) = publish(9);
    let predictor =
        Predictor::load(&store, None, FeatureSchema::lenient(), TargetLabel::At2300).unwrap();
    let app = app!(predictor);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(scenario())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let prediction = body["prediction"].as_f64().unwrap();
    // the last output is shifted by 2.5 on every training row
    assert!((2.5..=6.5).contains(&prediction));
}

#[actix_web::test]
async fn cross_origin_requests_are_allowed() {
    let (_dir, store) = publish(9);
    let predictor =
        Predictor::load(&store, None, FeatureSchema::lenient(), TargetLabel::Waking).unwrap();
    let app = test::init_service(
        App::new()
            .wrap(routes::cors())
            .app_data(web::Data::new(predictor))
            .configure(routes::configure),
    )
    .await;

    let origin = "http://dashboard.example";

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/predict")
        .insert_header((header::ORIGIN, origin))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let allowed = resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap();
    assert_eq!(allowed.to_str().unwrap(), origin);

    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header((header::ORIGIN, origin))
        .set_json(scenario())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let allowed = resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap();
    assert_eq!(allowed.to_str().unwrap(), origin);
}

#[::core::prelude::v1::test]
fn loading_an_empty_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();

    let err = Predictor::load(&store, None, FeatureSchema::lenient(), TargetLabel::Waking)
        .unwrap_err();
    assert!(matches!(
        err,
        PredictErr::Store(artifacts::StoreErr::NoCurrentVersion)
    ));
}

#[::core::prelude::v1::test]
fn a_pinned_version_is_loaded() {
    let (_dir, store) = publish(9);
    let version = store.current().unwrap().unwrap();

    let predictor = Predictor::load(
        &store,
        Some(version.id()),
        FeatureSchema::lenient(),
        TargetLabel::Waking,
    )
    .unwrap();
    assert_eq!(predictor.version(), Some(&version));

    let err = Predictor::load(
        &store,
        Some("v0000000000000-00000000"),
        FeatureSchema::lenient(),
        TargetLabel::Waking,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PredictErr::Store(artifacts::StoreErr::UnknownVersion(_))
    ));
}
