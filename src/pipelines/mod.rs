pub mod sentiment_analysis_pipeline;
pub mod store;

pub use sentiment_analysis_pipeline::{
    ModelSource, Sentiment, SentimentAnalysisPipeline, SentimentAnalysisPipelineBuilder,
    SentimentPrediction,
};
pub use store::ModelStore;
