//! Multinomial Naive-Bayes classifier over dense feature matrices.

use super::Classifier;
use crate::core::{Result, SentimentError};
use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CLASSIFIER_KIND: &str = "multinomial_nb";
pub const MODEL_TYPE: &str = "MultinomialNB";

/// Serialized form of a fitted [`MultinomialNb`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub kind: String,
    pub classes: Vec<u32>,
    pub class_log_prior: Vec<f32>,
    /// One row per class, one column per feature.
    pub feature_log_prob: Vec<Vec<f32>>,
}

#[derive(Debug, Clone)]
pub struct MultinomialNb {
    classes: Vec<u32>,
    class_log_prior: Vec<f32>,
    feature_log_prob: Vec<Vec<f32>>,
    /// `feature_log_prob` transposed to `(n_features, n_classes)`.
    weights: Tensor,
    /// `class_log_prior` as a `(n_classes,)` tensor.
    prior: Tensor,
}

impl MultinomialNb {
    /// Fits the classifier on a `(rows, n_features)` matrix with additive
    /// (Laplace/Lidstone) smoothing `alpha`.
    pub fn fit(x: &Tensor, labels: &[u32], alpha: f32) -> Result<Self> {
        let (rows, n_features) = x.dims2()?;
        if rows == 0 {
            return Err(SentimentError::Training(
                "cannot fit a classifier on zero samples".into(),
            ));
        }
        if labels.len() != rows {
            return Err(SentimentError::Training(format!(
                "got {} labels for {rows} samples",
                labels.len()
            )));
        }
        if alpha <= 0.0 {
            return Err(SentimentError::Training(format!(
                "smoothing alpha must be positive, got {alpha}"
            )));
        }

        let mut class_counts: BTreeMap<u32, usize> = BTreeMap::new();
        for label in labels {
            *class_counts.entry(*label).or_default() += 1;
        }
        let classes: Vec<u32> = class_counts.keys().copied().collect();
        let n_classes = classes.len();

        let mut one_hot = vec![0f32; rows * n_classes];
        for (row, label) in labels.iter().enumerate() {
            let col = classes.iter().position(|c| c == label).unwrap_or_default();
            one_hot[row * n_classes + col] = 1.0;
        }
        let y = Tensor::from_vec(one_hot, (rows, n_classes), x.device())?;

        // (n_classes, rows) x (rows, n_features)
        let feature_count = y.t()?.contiguous()?.matmul(x)?;
        let smoothed = feature_count.affine(1.0, alpha as f64)?;
        let totals = smoothed.sum_keepdim(1)?;
        let feature_log_prob = smoothed.broadcast_div(&totals)?.log()?.to_vec2::<f32>()?;

        let class_log_prior = class_counts
            .values()
            .map(|count| (*count as f32 / rows as f32).ln())
            .collect();

        tracing::debug!(rows, n_features, n_classes, "fitted multinomial naive bayes");

        Self::from_parts(classes, class_log_prior, feature_log_prob, x.device())
    }

    fn from_parts(
        classes: Vec<u32>,
        class_log_prior: Vec<f32>,
        feature_log_prob: Vec<Vec<f32>>,
        device: &Device,
    ) -> Result<Self> {
        let n_classes = classes.len();
        let n_features = feature_log_prob.first().map_or(0, Vec::len);

        let mut transposed = vec![0f32; n_features * n_classes];
        for (c, row) in feature_log_prob.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                transposed[j * n_classes + c] = *value;
            }
        }
        let weights = Tensor::from_vec(transposed, (n_features, n_classes), device)?;
        let prior = Tensor::new(class_log_prior.as_slice(), device)?;

        Ok(Self {
            classes,
            class_log_prior,
            feature_log_prob,
            weights,
            prior,
        })
    }

    pub fn class_log_prior(&self) -> &[f32] {
        &self.class_log_prior
    }

    pub fn to_artifact(&self) -> ClassifierArtifact {
        ClassifierArtifact {
            kind: CLASSIFIER_KIND.to_string(),
            classes: self.classes.clone(),
            class_log_prior: self.class_log_prior.clone(),
            feature_log_prob: self.feature_log_prob.clone(),
        }
    }

    /// Rebuilds a classifier from its artifact, checking that the shapes agree.
    pub fn from_artifact(artifact: ClassifierArtifact, source: &str) -> Result<Self> {
        let invalid = |details: String| SentimentError::ArtifactFormat {
            path: source.to_string(),
            details,
        };

        if artifact.kind != CLASSIFIER_KIND {
            return Err(invalid(format!(
                "expected kind '{CLASSIFIER_KIND}', found '{}'",
                artifact.kind
            )));
        }
        let n_classes = artifact.classes.len();
        if n_classes == 0 {
            return Err(invalid("no classes".into()));
        }
        if artifact.class_log_prior.len() != n_classes || artifact.feature_log_prob.len() != n_classes {
            return Err(invalid(format!(
                "{n_classes} classes but {} priors and {} feature rows",
                artifact.class_log_prior.len(),
                artifact.feature_log_prob.len()
            )));
        }
        let n_features = artifact.feature_log_prob[0].len();
        if n_features == 0 || artifact.feature_log_prob.iter().any(|row| row.len() != n_features) {
            return Err(invalid("feature rows are empty or ragged".into()));
        }

        Self::from_parts(
            artifact.classes,
            artifact.class_log_prior,
            artifact.feature_log_prob,
            &Device::Cpu,
        )
    }
}

impl Classifier for MultinomialNb {
    fn model_type(&self) -> &'static str {
        MODEL_TYPE
    }

    fn classes(&self) -> &[u32] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.feature_log_prob.first().map_or(0, Vec::len)
    }

    fn predict_proba(&self, x: &Tensor) -> Result<Vec<Vec<f32>>> {
        let (_, width) = x.dims2()?;
        if width != self.n_features() {
            return Err(SentimentError::Inference(format!(
                "input has {width} features, classifier expects {}",
                self.n_features()
            )));
        }

        // joint log likelihood, normalised per row
        let jll = x.matmul(&self.weights)?.broadcast_add(&self.prior)?;
        let proba = candle_nn::ops::softmax_last_dim(&jll)?;
        Ok(proba.to_vec2::<f32>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[[f32; 3]]) -> Tensor {
        let data: Vec<f32> = rows.iter().flatten().copied().collect();
        Tensor::from_vec(data, (rows.len(), 3), &Device::Cpu).unwrap()
    }

    fn fitted() -> MultinomialNb {
        let x = matrix(&[[1.0, 0.0, 0.5], [0.8, 0.0, 0.6], [0.0, 1.0, 0.5], [0.0, 0.9, 0.4]]);
        MultinomialNb::fit(&x, &[1, 1, 0, 0], 1.0).unwrap()
    }

    #[test]
    fn test_fit_learns_sorted_classes_and_priors() {
        let nb = fitted();
        assert_eq!(nb.classes(), &[0, 1]);
        assert_eq!(nb.n_features(), 3);
        for prior in nb.class_log_prior() {
            assert!((prior - 0.5f32.ln()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let nb = fitted();
        let proba = nb
            .predict_proba(&matrix(&[[1.0, 0.0, 0.0], [0.0, 0.0, 0.0]]))
            .unwrap();
        for row in &proba {
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
            assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        }
        // an all-zero row falls back to the (equal) priors
        assert!((proba[1][0] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_predict_separates_training_classes() {
        let nb = fitted();
        let labels = nb
            .predict(&matrix(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]))
            .unwrap();
        assert_eq!(labels, vec![1, 0]);
    }

    #[test]
    fn test_rejects_wrong_feature_width() {
        let nb = fitted();
        let x = Tensor::zeros((1, 2), candle_core::DType::F32, &Device::Cpu).unwrap();
        let err = nb.predict_proba(&x).unwrap_err();
        assert!(matches!(err, SentimentError::Inference(_)));
    }

    #[test]
    fn test_artifact_restores_same_probabilities() {
        let nb = fitted();
        let restored = MultinomialNb::from_artifact(nb.to_artifact(), "model.json").unwrap();
        let x = matrix(&[[0.3, 0.7, 0.1]]);
        assert_eq!(nb.predict_proba(&x).unwrap(), restored.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_artifact_rejects_ragged_rows() {
        let mut artifact = fitted().to_artifact();
        artifact.feature_log_prob[1].pop();
        let err = MultinomialNb::from_artifact(artifact, "model.json").unwrap_err();
        assert!(matches!(err, SentimentError::ArtifactFormat { .. }));
    }
}
