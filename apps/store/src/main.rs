use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use platform_store::api::{router, AppState};
use platform_store::config::{ServerSettings, SqlSettings};
use platform_store::domain::repositories::Store;
use platform_store::infrastructure::SqlStore;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let sql_settings = SqlSettings::from_env().expect("Invalid database settings");
    let server_settings = ServerSettings::from_env().expect("Invalid server settings");

    // Connect to database
    let store = Arc::new(
        SqlStore::new(&sql_settings)
            .await
            .expect("Failed to connect to database"),
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(AppState::new(store.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    tracing::info!("Server listening on {}", server_settings.addr);

    let listener = tokio::net::TcpListener::bind(server_settings.addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");

    store.close().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
