use std::process;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use video_service::{
    config::Config,
    db::{MemoryStore, PgStore},
    routes,
    AppState,
};

#[tokio::main]
async fn main() {

    tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .pretty()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Invalid configuration: {}", err);
            process::exit(1);
        }
    };

    let state = match &config.database_url {
        Some(database_url) => AppState::new(Arc::new(PgStore::new(database_url)), &config),
        None => {
            tracing::warn!("DATABASE_URL not set, data is kept in memory and lost on restart");
            AppState::new(Arc::new(MemoryStore::new()), &config)
        }
    };

    let app = routes::router(state);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {}", config.port, err);
            process::exit(1);
        }
    };

    tracing::info!("Listening on port {}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
        process::exit(1);
    }
}
