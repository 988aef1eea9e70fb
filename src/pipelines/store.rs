//! Process-wide model store.
//!
//! The store owns an init-once slot for the [`SentimentAnalysisPipeline`].
//! It is filled by [`ModelStore::load`] before the server accepts traffic and
//! is read without locking afterwards.

use super::sentiment_analysis_pipeline::{
    ModelSource, SentimentAnalysisPipeline, SentimentAnalysisPipelineBuilder, SentimentPrediction,
};
use crate::core::{Result, SentimentError, ServiceConfig};
use crate::models::naive_bayes::MODEL_TYPE;
use crate::models::{Classifier, Vectorizer};
use once_cell::sync::OnceCell;
use std::path::PathBuf;

#[derive(Debug)]
pub struct ModelStore {
    vectorizer_path: PathBuf,
    model_path: PathBuf,
    pipeline: OnceCell<SentimentAnalysisPipeline>,
}

impl ModelStore {
    pub fn new(vectorizer_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            vectorizer_path: vectorizer_path.into(),
            model_path: model_path.into(),
            pipeline: OnceCell::new(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(&config.vectorizer_path, &config.model_path)
    }

    /// Loads both artifacts, or trains and saves the demo model when either
    /// is missing. Returns `None` if the store was already loaded.
    pub fn load(&self) -> Result<Option<ModelSource>> {
        let mut source = None;
        self.pipeline.get_or_try_init(|| {
            let (pipeline, from) =
                SentimentAnalysisPipelineBuilder::new(&self.vectorizer_path, &self.model_path)
                    .build()?;
            source = Some(from);
            Ok::<_, SentimentError>(pipeline)
        })?;
        Ok(source)
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.get().is_some()
    }

    pub fn pipeline(&self) -> Result<&SentimentAnalysisPipeline> {
        self.pipeline.get().ok_or(SentimentError::NotReady)
    }

    /// Vectorizes and classifies `texts`, preserving order.
    pub fn transform_and_predict(&self, texts: &[String]) -> Result<Vec<SentimentPrediction>> {
        self.pipeline()?.predict_batch(texts)
    }

    /// Up to `n` feature names known to the vectorizer; empty when not loaded.
    pub fn feature_sample(&self, n: usize) -> Vec<String> {
        self.pipeline
            .get()
            .map(|p| p.vectorizer().feature_names().iter().take(n).cloned().collect())
            .unwrap_or_default()
    }

    pub fn model_type(&self) -> &'static str {
        self.pipeline
            .get()
            .map_or(MODEL_TYPE, |p| p.classifier().model_type())
    }
}
