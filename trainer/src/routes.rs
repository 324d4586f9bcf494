use actix_cors::Cors;
use actix_web::{HttpResponse, ResponseError, error::InternalError, get, post, web};
use comms::{ErrorResponse, MessageResponse, msg::TRAINED_SUCCESSFULLY};
use serde_json::Value;

use crate::{TrainErr, TrainingService};

/// Largest accepted training body.
const JSON_LIMIT: usize = 16 * 1024 * 1024;

/// Registers the training routes on an app.
///
/// The app must also hold a `web::Data<TrainingService>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(train).service(versions);
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
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            let response = HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string()));
            InternalError::from_response(err, response).into()
        })
}

fn log_failure(e: &TrainErr) {
    match e {
        TrainErr::MissingTargets(missing) => {
            log::warn!("training data lacks target columns {missing:?}")
        }
        e if e.status_code().is_server_error() => log::error!("training failed: {e}"),
        e => log::warn!("rejected training request: {e}"),
    }
}

#[post("/train")]
async fn train(
    service: web::Data<TrainingService>,
    body: web::Json<Value>,
) -> Result<HttpResponse, TrainErr> {
    let version = web::block(move || service.train(body.into_inner()))
        .await
        .map_err(|e| TrainErr::Interrupted(e.to_string()))
        .and_then(|trained| trained)
        .inspect_err(log_failure)?;

    log::info!("model trained and published as {version}");
    Ok(HttpResponse::Ok().json(MessageResponse::new(TRAINED_SUCCESSFULLY)))
}

#[get("/versions")]
async fn versions(service: web::Data<TrainingService>) -> Result<HttpResponse, TrainErr> {
    let listing = service.versions().inspect_err(log_failure)?;
    Ok(HttpResponse::Ok().json(listing))
}
