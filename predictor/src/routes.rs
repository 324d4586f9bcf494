use actix_cors::Cors;
use actix_web::{HttpResponse, ResponseError, error::InternalError, post, web};
use comms::{ErrorResponse, PredictResponse};
use serde_json::Value;

use crate::{PredictErr, Predictor};

/// Registers the prediction routes on an app.
///
/// The app must also hold a `web::Data<Predictor>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(predict);
}

/// Allows cross-origin requests from any origin, method and header.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
}

/// Answers unreadable JSON bodies with `400 {"error": ...}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string()));
        InternalError::from_response(err, response).into()
    })
}

#[post("/predict")]
async fn predict(
    predictor: web::Data<Predictor>,
    body: web::Json<Value>,
) -> Result<HttpResponse, PredictErr> {
    log::info!("received a prediction request");

    let prediction = predictor.predict(&body).inspect_err(|e| {
        if e.status_code().is_server_error() {
            log::error!("error during prediction: {e}");
        } else {
            log::warn!("rejected prediction request: {e}");
        }
    })?;

    Ok(HttpResponse::Ok().json(PredictResponse { prediction }))
}
