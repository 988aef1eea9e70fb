//! HTTP surface of the service.

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod telemetry;

use crate::core::ServiceConfig;
use crate::pipelines::ModelStore;
use anyhow::Context;
use axum::routing::{get, post};
use axum::{middleware, Router};
use metrics::HttpMetrics;
use std::sync::Arc;

/// State shared read-only by every handler.
pub struct AppState {
    pub store: Arc<ModelStore>,
    pub model_version: String,
    pub metrics: HttpMetrics,
}

impl AppState {
    pub fn new(store: Arc<ModelStore>, model_version: impl Into<String>) -> Self {
        Self {
            store,
            model_version: model_version.into(),
            metrics: HttpMetrics::new(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/predict", post(handlers::predict))
        .route("/batch-predict", post(handlers::batch_predict))
        .route("/model-info", get(handlers::model_info))
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), metrics::track))
        .with_state(state)
}

/// Binds `config.bind_addr()` and serves until the process is killed.
///
/// The store should already be loaded; the server does not load it.
pub async fn serve(config: &ServiceConfig, store: Arc<ModelStore>) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(store, config.model_version.clone()));
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
