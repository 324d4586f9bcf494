use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use artifacts::ArtifactStore;
use log::info;

use predictor::{Predictor, PredictorConfig, routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = PredictorConfig::from_env().context("invalid predictor configuration")?;

    let store = ArtifactStore::open(&config.store)
        .with_context(|| format!("failed to open model store {}", config.store.display()))?;

    let predictor = Predictor::load(
        &store,
        config.version.as_deref(),
        config.schema(),
        config.target,
    )
    .context("error loading model or scaler")?;
    let predictor = web::Data::new(predictor);

    let addr = config.addr();
    info!("starting prediction server at {addr}");

    HttpServer::new(move || {
        App::new()
            .wrap(routes::cors())
            .wrap(Logger::default())
            .app_data(predictor.clone())
            .configure(routes::configure)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {addr}"))?
    .run()
    .await?;

    Ok(())
}
