//! droply server entry point.
//!
//! Resolves configuration from the environment once at startup, validates
//! the content-store directory and serves the REST API.
//!
//! # Environment Variables
//! - `DROPLY_REST_ADDR`: server address (default: "0.0.0.0:3000")
//! - `DROPLY_STORAGE_DIR`: content-store directory (default: "storage",
//!   created if absent)

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use droply_files::{FileStore, StoreConfig, DEFAULT_STORAGE_DIR};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("droply_files=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("DROPLY_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let storage_dir =
        std::env::var("DROPLY_STORAGE_DIR").unwrap_or_else(|_| DEFAULT_STORAGE_DIR.into());

    std::fs::create_dir_all(&storage_dir)?;
    let config = StoreConfig::new(Path::new(&storage_dir))?;

    tracing::info!("-- Starting droply REST API on {}", addr);
    tracing::info!("-- Content store at {}", config.storage_dir().display());

    let state = AppState {
        store: Arc::new(FileStore::new(config)),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
