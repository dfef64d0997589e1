pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;
pub use api::AppState;

// Export all model types
pub use model::*;

// Export store types
pub use store::{InMemoryStore, PostgresStore, Store, StoreError};

use std::sync::Arc;
use std::time::Duration;

/// Router with every route mounted over the given store.
pub fn app<S: Store + 'static>(store: Arc<S>, ping_timeout: Duration) -> axum::Router {
    api::routes::create_router().with_state(AppState::new(store, ping_timeout))
}

/// Serve the API over `listener` until the process stops.
pub async fn serve<S: Store + 'static>(
    listener: tokio::net::TcpListener,
    store: Arc<S>,
    ping_timeout: Duration,
) -> anyhow::Result<()> {
    axum::serve(listener, app(store, ping_timeout)).await?;
    Ok(())
}

// Function for integration testing
pub async fn run_server() -> anyhow::Result<()> {
    use tokio::net::TcpListener;

    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let config = crate::config::AppConfig::load()?;

    let database_url = config.database_url()?;
    let postgres_store =
        crate::store::PostgresStore::new(&database_url, config.database.max_connections).await?;
    postgres_store.ensure_schema().await?;

    let listener = TcpListener::bind(&config.server_address()).await?;
    serve(listener, Arc::new(postgres_store), config.ping_timeout()).await
}
