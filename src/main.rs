mod models;
mod handlers;
mod services;
mod engine;
mod worker;
mod config;
mod errors;

use std::sync::Arc;
use std::time::Duration;
use crate::{
    config::{Config, StorageBackend},
    engine::{AutomationEngine, EngineConfig},
    handlers::AppState,
    services::{MemoryMetadataStore, MetadataStore, MockAutomation, RedisMetadataStore},
};

#[tokio::main]
async fn main() {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().expect("Failed to load configuration");

    // Image metadata store
    let store: Arc<dyn MetadataStore> = match config.storage.backend {
        StorageBackend::Redis => {
            let client = redis::Client::open(config.redis.url.as_str())
                .expect("Failed to connect to Redis");
            Arc::new(RedisMetadataStore::new(Arc::new(client)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory metadata store; image records are lost on restart");
            Arc::new(MemoryMetadataStore::new())
        }
    };

    // Automation backend and engine, one per process
    let backend = Arc::new(MockAutomation::new(Duration::from_millis(
        config.automation.simulated_latency_ms,
    )));
    let engine = AutomationEngine::new(
        backend,
        store.clone(),
        EngineConfig {
            call_timeout: config.automation.call_timeout_secs.map(Duration::from_secs),
        },
    );

    let app = handlers::router(AppState { engine, store }, config.upload.max_body_size);

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", config.server.host, config.server.port)
    )
    .await
    .expect("Failed to bind server");

    tracing::info!("Server running on {}:{}", config.server.host, config.server.port);
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Failed to start server");
}
