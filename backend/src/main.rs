//! Certificate Platform - Backend Server

use std::{net::SocketAddr, sync::Arc, time::Duration};

use certificate_backend::{
    config::{Config, StorageBackend},
    create_app,
    pdf::BrowserLauncher,
    store::{CertificateStore, MemoryStore, PostgresStore},
    AppState,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Owner recorded on the built-in template
const SYSTEM_USER_ID: i64 = 0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "certificate_server=debug,certificate_backend=debug,tower_http=debug,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Certificate Platform Server");
    tracing::info!("Environment: {}", config.environment);

    let store = connect_store(&config).await?;
    let launcher = browser_launcher(&config);

    // Create application state
    let state = AppState::new(config.clone(), store, launcher);
    state
        .templates
        .ensure_default_template(SYSTEM_USER_ID)
        .await?;

    // Build application
    let app = create_app(state.clone());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down browser pool");
    state.renderer.close_browser().await;

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn CertificateStore>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryStore::with_demo_catalog()))
        }
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;
            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Ok(Arc::new(PostgresStore::new(db_pool)))
        }
    }
}

#[cfg(feature = "chromium")]
fn browser_launcher(config: &Config) -> Arc<dyn BrowserLauncher> {
    Arc::new(certificate_backend::pdf::ChromiumLauncher::new(&config.pdf))
}

#[cfg(not(feature = "chromium"))]
fn browser_launcher(_config: &Config) -> Arc<dyn BrowserLauncher> {
    tracing::warn!("Built without Chromium; PDF and preview rendering will fail");
    Arc::new(certificate_backend::pdf::DisabledLauncher)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
