use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to initialize telemetry subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs a global fmt subscriber filtered by `RUST_LOG` (default `info`).
pub fn init() -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC => {info}");
        hook(info);
    }));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()?;
    Ok(())
}
