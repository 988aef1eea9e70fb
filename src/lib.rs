pub mod core;
pub mod loaders;
pub mod models;
pub mod pipelines;
pub mod server;

// Re-export the types most callers need
pub use crate::core::{Result, SentimentError, ServiceConfig};
pub use pipelines::{
    ModelStore, Sentiment, SentimentAnalysisPipeline, SentimentAnalysisPipelineBuilder,
    SentimentPrediction,
};
