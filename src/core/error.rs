use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentimentError {
    /// The model store has not been loaded yet.
    #[error("model not loaded")]
    NotReady,

    // Artifacts
    #[error("Invalid artifact {path}: {details}")]
    ArtifactFormat { path: String, details: String },

    #[error("Artifact I/O failed for {path}: {source}")]
    ArtifactIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Artifact mismatch: vectorizer has {vectorizer_features} features, classifier expects {classifier_features}"
    )]
    ArtifactMismatch {
        vectorizer_features: usize,
        classifier_features: usize,
    },

    // Training
    #[error("Training failed: {0}")]
    Training(String),

    // Inference
    #[error("Inference failed: {0}")]
    Inference(String),

    // Configuration
    #[error("Invalid configuration for {key}: {details}")]
    Config { key: String, details: String },

    // Pass-through from dependencies
    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SentimentError>;
