//! Serving module
//!
//! This module provides:
//! - Request/response schemas with bounds validation
//! - The atomically swappable shared-model handle
//! - Axum routes and the background retrain task

pub mod routes;
pub mod schemas;
pub mod state;

pub use routes::router;
pub use schemas::{
    BatchPredictRequest, BatchPredictResponse, PredictRequest, PredictResponse, ValidationError,
    MAX_BATCH_SIZE,
};
pub use state::{AppState, ModelHandle, RetrainConfig};

use std::net::SocketAddr;
use tracing::info;

/// Bind and serve until shutdown.
pub async fn run(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
