use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use artifacts::ArtifactStore;
use log::info;

use trainer::{TrainerConfig, TrainingService, routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = TrainerConfig::from_env().context("invalid trainer configuration")?;

    let store = ArtifactStore::open(&config.store)
        .with_context(|| format!("failed to open model store {}", config.store.display()))?;

    if let Some(current) = store.current().context("failed to read the current version")? {
        info!("model store {} serves version {current}", config.store.display());
    }

    let service =
        TrainingService::new(config.model(), store).with_keep_versions(config.keep_versions);
    let service = web::Data::new(service);

    let addr = config.addr();
    info!(
        "starting training server at {addr} with {} trees per target",
        config.n_estimators
    );

    HttpServer::new(move || {
        App::new()
            .wrap(routes::cors())
            .wrap(Logger::default())
            .app_data(service.clone())
            .configure(routes::configure)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {addr}"))?
    .run()
    .await?;

    Ok(())
}
