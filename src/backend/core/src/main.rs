//! Salon Server - Main entry point

use std::sync::Arc;

use salon_core::{
    api::{self, AppState},
    appointments::AppointmentService,
    config::Config,
    middleware::Authenticator,
    rbac::PermissionEngine,
    store::{DynStore, InMemoryStore, PgStore},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    let telemetry_guard = telemetry::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        transition_policy = ?config.booking.transition_policy,
        double_booking = ?config.booking.double_booking,
        "Starting Salon Server"
    );

    let store: DynStore = if config.database.is_in_memory() {
        tracing::warn!("Using the in-memory store; data is lost on restart");
        Arc::new(InMemoryStore::new())
    } else {
        let pg = PgStore::connect(&config.database).await?;
        if config.database.run_migrations {
            pg.migrate().await?;
            tracing::info!("Database migrations applied");
        }
        tracing::info!("Connected to database");
        Arc::new(pg)
    };

    let authenticator = Authenticator::new(config.auth.to_auth_config()?)?;

    let app_state = AppState {
        appointments: AppointmentService::new(store, config.booking),
        permissions: PermissionEngine::standard(),
        identity: Arc::new(authenticator),
    };

    let app = api::build_router(app_state, config.server.request_timeout);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry_guard.shutdown();
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
