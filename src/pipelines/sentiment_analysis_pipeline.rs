use crate::core::{Result, SentimentError};
use crate::loaders::{ClassifierLoader, VectorizerLoader};
use crate::models::{argmax, Classifier, MultinomialNb, TfidfVectorizer, Vectorizer};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound on the vocabulary of the bootstrap demo model.
pub const DEMO_MAX_FEATURES: usize = 100;

/// Laplace smoothing used when training the classifier.
pub const DEMO_ALPHA: f32 = 1.0;

/// Training sentences for the bootstrap demo model, paired with [`DEMO_LABELS`].
pub const DEMO_TEXTS: [&str; 6] = [
    "I love this product, it's amazing!",
    "This is the best thing ever",
    "Wonderful experience, highly recommend",
    "Terrible product, waste of money",
    "I hate this, very disappointing",
    "Awful service, never again",
];

/// 1 = positive, 0 = negative.
pub const DEMO_LABELS: [u32; 6] = [1, 1, 1, 0, 0, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    pub fn from_label(label: u32) -> Self {
        if label == 1 {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label and confidence for a single input text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentPrediction {
    pub sentiment: Sentiment,
    /// Highest class probability, in `[0, 1]`.
    pub confidence: f32,
}

/// Where a built pipeline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    /// Both artifacts were read from disk.
    Loaded,
    /// Artifacts were missing; the demo model was trained and saved.
    Trained,
}

/// Builder for a [`SentimentAnalysisPipeline`] backed by artifacts on disk.
///
/// `build()` reads both artifacts when they exist. When either is missing it
/// trains the demo model on [`DEMO_TEXTS`] and writes both artifacts so the
/// next start can load them.
#[derive(Debug, Clone)]
pub struct SentimentAnalysisPipelineBuilder {
    vectorizer_path: PathBuf,
    model_path: PathBuf,
    max_features: Option<usize>,
    alpha: f32,
}

impl SentimentAnalysisPipelineBuilder {
    pub fn new(vectorizer_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            vectorizer_path: vectorizer_path.into(),
            model_path: model_path.into(),
            max_features: Some(DEMO_MAX_FEATURES),
            alpha: DEMO_ALPHA,
        }
    }

    /// Caps the vocabulary size used when the fallback model is trained.
    pub fn max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Smoothing parameter used when the fallback model is trained.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn build(self) -> Result<(SentimentAnalysisPipeline, ModelSource)> {
        let vectorizer_loader = VectorizerLoader::new(&self.vectorizer_path);
        let classifier_loader = ClassifierLoader::new(&self.model_path);

        if classifier_loader.file.exists() && vectorizer_loader.file.exists() {
            let classifier = classifier_loader.load()?;
            let vectorizer = vectorizer_loader.load()?;
            let pipeline = SentimentAnalysisPipeline::new(vectorizer, classifier)?;
            tracing::info!(
                model = %classifier_loader.file.display(),
                vectorizer = %vectorizer_loader.file.display(),
                "Loaded existing model"
            );
            return Ok((pipeline, ModelSource::Loaded));
        }

        let texts: Vec<String> = DEMO_TEXTS.iter().map(|t| t.to_string()).collect();
        let pipeline =
            SentimentAnalysisPipeline::train(&texts, &DEMO_LABELS, self.max_features, self.alpha)?;

        // Both are written before either is renamed; the vectorizer lands
        // last, so a complete pair exists only after a full save.
        let staged_classifier = classifier_loader.stage(&pipeline.classifier)?;
        let staged_vectorizer = vectorizer_loader.stage(&pipeline.vectorizer)?;
        vectorizer_loader.file.remove()?;
        staged_classifier.commit()?;
        staged_vectorizer.commit()?;
        tracing::info!(
            features = pipeline.vectorizer.n_features(),
            model = %classifier_loader.file.display(),
            vectorizer = %vectorizer_loader.file.display(),
            "Trained and saved new model"
        );

        Ok((pipeline, ModelSource::Trained))
    }
}

/// A fitted vectorizer and classifier pair.
///
/// The two halves are only ever constructed together, and construction fails
/// when the classifier's feature width does not match the vectorizer.
#[derive(Debug, Clone)]
pub struct SentimentAnalysisPipeline<V = TfidfVectorizer, C = MultinomialNb> {
    vectorizer: V,
    classifier: C,
}

impl SentimentAnalysisPipeline {
    /// Fits a fresh vectorizer and classifier on labelled texts.
    pub fn train(
        texts: &[String],
        labels: &[u32],
        max_features: Option<usize>,
        alpha: f32,
    ) -> Result<Self> {
        let vectorizer = TfidfVectorizer::fit(texts, max_features)?;
        let x = vectorizer.transform(texts)?;
        let classifier = MultinomialNb::fit(&x, labels, alpha)?;
        Self::new(vectorizer, classifier)
    }
}

impl<V: Vectorizer, C: Classifier> SentimentAnalysisPipeline<V, C> {
    pub fn new(vectorizer: V, classifier: C) -> Result<Self> {
        if vectorizer.n_features() != classifier.n_features() {
            return Err(SentimentError::ArtifactMismatch {
                vectorizer_features: vectorizer.n_features(),
                classifier_features: classifier.n_features(),
            });
        }
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    pub fn vectorizer(&self) -> &V {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Predicts the sentiment of a single text.
    pub fn predict(&self, text: &str) -> Result<SentimentPrediction> {
        self.predict_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| SentimentError::Inference("no prediction produced".into()))
    }

    /// Predicts every text in order; any failure fails the whole batch.
    pub fn predict_batch(&self, texts: &[String]) -> Result<Vec<SentimentPrediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let x = self.vectorizer.transform(texts)?;
        let proba = self.classifier.predict_proba(&x)?;
        let classes = self.classifier.classes();

        proba
            .iter()
            .map(|row| {
                let (best, confidence) = argmax(row)
                    .ok_or_else(|| SentimentError::Inference("empty probability row".into()))?;
                Ok(SentimentPrediction {
                    sentiment: Sentiment::from_label(classes[best]),
                    confidence: confidence.clamp(0.0, 1.0),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn demo_pipeline() -> SentimentAnalysisPipeline {
        let texts: Vec<String> = DEMO_TEXTS.iter().map(|t| t.to_string()).collect();
        SentimentAnalysisPipeline::train(&texts, &DEMO_LABELS, Some(DEMO_MAX_FEATURES), DEMO_ALPHA)
            .unwrap()
    }

    #[test]
    fn test_demo_model_fits_its_training_set() {
        let pipeline = demo_pipeline();
        assert!(pipeline.vectorizer().n_features() <= DEMO_MAX_FEATURES);

        for (text, label) in DEMO_TEXTS.iter().zip(DEMO_LABELS) {
            let prediction = pipeline.predict(text).unwrap();
            assert_eq!(prediction.sentiment, Sentiment::from_label(label), "{text}");
            assert!(prediction.confidence >= 0.5 && prediction.confidence <= 1.0);
        }
    }

    #[test]
    fn test_predict_batch_preserves_order_and_length() {
        let pipeline = demo_pipeline();
        let texts = vec![
            "amazing, wonderful".to_string(),
            "terrible waste".to_string(),
            "ok".to_string(),
        ];
        let predictions = pipeline.predict_batch(&texts).unwrap();
        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].sentiment, Sentiment::Positive);
        assert_eq!(predictions[1].sentiment, Sentiment::Negative);
        assert!(pipeline.predict_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_mismatched_pair_is_rejected() {
        let vectorizer = TfidfVectorizer::fit(&["only two".to_string()], None).unwrap();
        let err = SentimentAnalysisPipeline::new(vectorizer, demo_pipeline().classifier().clone())
            .unwrap_err();
        assert!(matches!(err, SentimentError::ArtifactMismatch { vectorizer_features: 2, .. }));
    }

    #[test]
    fn test_builder_trains_then_loads() {
        let dir = TempDir::new().unwrap();
        let vectorizer_path = dir.path().join("models/vectorizer.json");
        let model_path = dir.path().join("models/sentiment_model.json");

        let (trained, source) =
            SentimentAnalysisPipelineBuilder::new(&vectorizer_path, &model_path).build().unwrap();
        assert_eq!(source, ModelSource::Trained);
        assert!(vectorizer_path.is_file() && model_path.is_file());

        let (loaded, source) =
            SentimentAnalysisPipelineBuilder::new(&vectorizer_path, &model_path).build().unwrap();
        assert_eq!(source, ModelSource::Loaded);
        assert_eq!(
            loaded.vectorizer().feature_names(),
            trained.vectorizer().feature_names()
        );

        let text = "highly recommend";
        assert_eq!(
            loaded.predict(text).unwrap().sentiment,
            trained.predict(text).unwrap().sentiment
        );
    }

    #[test]
    fn test_interrupted_save_is_retrained_on_next_start() {
        let dir = TempDir::new().unwrap();
        let vectorizer_path = dir.path().join("vectorizer.json");
        let model_path = dir.path().join("sentiment_model.json");
        SentimentAnalysisPipelineBuilder::new(&vectorizer_path, &model_path).build().unwrap();

        // state left behind by a crash between the two renames
        let full = std::fs::read(&vectorizer_path).unwrap();
        std::fs::remove_file(&vectorizer_path).unwrap();
        let staging = dir.path().join("vectorizer.json.tmp");
        std::fs::write(&staging, &full[..full.len() / 2]).unwrap();

        let (_, source) =
            SentimentAnalysisPipelineBuilder::new(&vectorizer_path, &model_path).build().unwrap();
        assert_eq!(source, ModelSource::Trained);
        assert!(!staging.exists());

        let (_, source) =
            SentimentAnalysisPipelineBuilder::new(&vectorizer_path, &model_path).build().unwrap();
        assert_eq!(source, ModelSource::Loaded);
    }

    #[test]
    fn test_builder_retrains_when_one_artifact_is_missing() {
        let dir = TempDir::new().unwrap();
        let vectorizer_path = dir.path().join("vectorizer.json");
        let model_path = dir.path().join("sentiment_model.json");
        SentimentAnalysisPipelineBuilder::new(&vectorizer_path, &model_path).build().unwrap();

        std::fs::remove_file(&vectorizer_path).unwrap();
        let (_, source) =
            SentimentAnalysisPipelineBuilder::new(&vectorizer_path, &model_path).build().unwrap();
        assert_eq!(source, ModelSource::Trained);
    }
}
