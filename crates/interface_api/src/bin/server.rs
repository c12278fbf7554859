//! Policy Assembly Engine - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! API_DATABASE_URL=postgres://... cargo run --bin policy-assembly-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `API_DEFAULT_STATE` - Fallback tax jurisdiction, e.g. `CA`

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app_services::{AssemblyService, LoggingDocumentGenerator};
use core_kernel::{IdentifierAllocator, SystemClock};
use infra_db::{
    create_pool, run_migrations, DatabaseConfig, PostgresAssemblyStore, PostgresCustomerPort,
    PostgresSequence,
};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading API_ configuration")?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting policy assembly API server"
    );

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone())
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30)),
    )
    .await
    .context("connecting to database")?;
    run_migrations(&pool).await.context("applying migrations")?;
    tracing::info!("Database ready");

    let clock = Arc::new(SystemClock);
    let mut service = AssemblyService::new(
        Arc::new(PostgresCustomerPort::new(pool.clone())),
        Arc::new(PostgresAssemblyStore::new(pool.clone())),
        IdentifierAllocator::new(Arc::new(PostgresSequence::new(pool.clone())), clock.clone()),
        Arc::new(LoggingDocumentGenerator),
        clock,
    );
    if let Some(state) = &config.default_state {
        service = service.with_default_state(state.clone());
    }

    let addr: SocketAddr = config.server_addr().parse().context("parsing server address")?;
    let app = create_router(AppState::new(service, config).with_pool(pool));

    tracing::info!(%addr, "Server listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
