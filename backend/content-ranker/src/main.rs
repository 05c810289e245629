use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use content_ranker::{
    handlers,
    persistence::{build_snapshot_store, SnapshotWriter},
    Config, EngineSettings, RankingEngine,
};

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,actix_web=info".into()))
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_line_number(true)
                .with_target(true),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    info!(
        "Starting {} v{} on {}:{}",
        config.service_name,
        env!("CARGO_PKG_VERSION"),
        config.http_host,
        config.http_port
    );

    let snapshot_store =
        build_snapshot_store(&config).context("failed to configure snapshot persistence")?;

    let history = match snapshot_store.load().await {
        Ok(history) => {
            info!(snapshots = history.len(), "Loaded metrics history");
            history
        }
        Err(e) => {
            warn!(error = %e, "Failed to load metrics history, starting empty");
            Vec::new()
        }
    };

    let (writer, writer_handle) = SnapshotWriter::spawn(snapshot_store);
    let engine = web::Data::new(RankingEngine::new(
        EngineSettings::from(&config),
        writer,
        history,
    ));

    let app_engine = engine.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(app_engine.clone())
            .configure(handlers::configure)
    })
    .bind((config.http_host.as_str(), config.http_port))
    .with_context(|| format!("failed to bind {}:{}", config.http_host, config.http_port))?
    .run()
    .await
    .map_err(|e| {
        error!("HTTP server error: {}", e);
        e
    })?;

    // Closing the last writer handle lets the persistence task drain and exit
    drop(engine);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer_handle)
        .await
        .is_err()
    {
        warn!("Snapshot writer did not drain before shutdown");
    }

    info!("Shutdown complete");
    Ok(())
}
