use anyhow::Context;
use axum::extract::State;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

mod api;
mod app_env;
mod domain;
mod dto;
mod external_connections;
mod logging;
mod persistence;
mod routes;
mod routing_utils;

/// Data shared by every request handler
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
}

type AppState = State<Arc<SharedData>>;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    let config = app_env::AppConfig::from_env()?;

    let otel_exporters = config
        .otel
        .as_ref()
        .map(logging::init_exporters)
        .transpose()?;
    let telemetry = logging::setup_logging_and_tracing(logging::init_env_filter()?, otel_exporters);

    info!("Connecting to database");
    let db = persistence::connect_sqlx(&config.database_url).await?;
    let ext_cxn = persistence::ExternalConnectivity::new(db);

    let schema_outcome = domain::schema::reconcile_schema(
        &ext_cxn,
        &persistence::db_schema_driven_ports::DbSchemaMigrator,
    )
    .await
    .context("reconciling the database schema")?;
    info!(
        year_column_added = schema_outcome.year_column_added,
        rows_backfilled = ?schema_outcome.rows_backfilled,
        "Database schema is up to date"
    );

    let shared_data = Arc::new(SharedData {
        ext_cxn: ext_cxn.clone(),
    });
    let router = routes::build_router(shared_data, &config.frontend_dir);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding to port {}", config.port))?;
    info!("Listening on port {}", config.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP requests")?;

    info!("Server stopped, releasing resources");
    ext_cxn.close().await;
    telemetry.shutdown();

    Ok(())
}

/// Resolves once the process receives Ctrl-C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Could not listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Could not listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
