//! CardioCare API server
//!
//! Main entry point for the CardioCare records service.

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing::info;
use tracing_actix_web::TracingLogger;

use cardiocare::{api, config, db, telemetry, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = config::load_config().context("failed to load configuration")?;
    telemetry::init(&config.log);

    let database = db::Database::connect(&config.database)
        .await
        .with_context(|| format!("failed to connect to {}", config.database.url))?;
    database
        .run_migrations()
        .await
        .context("failed to run database migrations")?;

    let state = AppState::from_config(&config, database).context("failed to build prediction client")?;
    let state = web::Data::new(state);

    let addr = (config.server.host.clone(), config.server.port);
    info!(host = %addr.0, port = addr.1, "starting server");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .wrap(TracingLogger::default())
            .configure(api::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
