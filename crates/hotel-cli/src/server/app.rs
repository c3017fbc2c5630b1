use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use hotel_classifiers::TrainedPipeline;

use crate::server::handler::{health, predict};

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TrainedPipeline>,
}

impl AppState {
    pub fn new(pipeline: TrainedPipeline) -> Self {
        AppState {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(app_state)
}

/// Port precedence: `--port` flag, then the `PORT` variable, then 5000.
pub fn resolve_port(flag: Option<u16>) -> Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match std::env::var("PORT") {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("PORT is not a valid port number: {:?}", value)),
        Err(_) => Ok(DEFAULT_PORT),
    }
}

/// Load the artifact once and serve predictions until the process stops.
pub async fn serve(artifact: &Path, port: u16) -> Result<()> {
    let pipeline = TrainedPipeline::load(artifact)
        .with_context(|| format!("Failed to load model artifact: {:?}", artifact))?;
    let app = create_router(AppState::new(pipeline));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Serving predictions on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
