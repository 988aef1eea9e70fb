use anyhow::Context;
use sentiment_service::core::ServiceConfig;
use sentiment_service::pipelines::{ModelSource, ModelStore};
use sentiment_service::server::{self, telemetry};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(err) = telemetry::init() {
        eprintln!("{err}");
    }

    if let Err(err) = run().await {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    tracing::info!("Starting Sentiment Analysis API...");
    let config = ServiceConfig::from_env().context("invalid configuration")?;

    // Serve only once the model is in memory.
    let store = Arc::new(ModelStore::from_config(&config));
    let loader = Arc::clone(&store);
    let source = tokio::task::spawn_blocking(move || loader.load())
        .await
        .context("model loading task panicked")?
        .context("failed to load or train the model")?;
    if let Some(ModelSource::Trained) = source {
        tracing::info!("serving the bootstrap demo model");
    }

    server::serve(&config, store).await
}
