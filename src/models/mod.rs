pub mod naive_bayes;
pub mod tfidf;

pub use naive_bayes::MultinomialNb;
pub use tfidf::TfidfVectorizer;

use crate::core::Result;
use candle_core::Tensor;

/// Converts raw text into a fixed-width numeric feature matrix.
pub trait Vectorizer: Send + Sync {
    /// Returns a `(texts.len(), n_features)` matrix, one row per input text.
    fn transform(&self, texts: &[String]) -> Result<Tensor>;

    fn n_features(&self) -> usize;

    /// Feature names in column order.
    fn feature_names(&self) -> &[String];
}

/// Maps a feature matrix to class probabilities.
pub trait Classifier: Send + Sync {
    /// Human readable model family, reported by `/model-info`.
    fn model_type(&self) -> &'static str;

    /// Class labels in probability column order.
    fn classes(&self) -> &[u32];

    /// Number of feature columns the classifier was fitted on.
    fn n_features(&self) -> usize;

    /// One probability row per input row; each row sums to 1.
    fn predict_proba(&self, x: &Tensor) -> Result<Vec<Vec<f32>>>;

    /// Most probable class for each row.
    fn predict(&self, x: &Tensor) -> Result<Vec<u32>> {
        let classes = self.classes();
        self.predict_proba(x)?
            .iter()
            .map(|row| {
                let (best, _) = argmax(row).ok_or_else(|| {
                    crate::core::SentimentError::Inference("classifier has no classes".into())
                })?;
                Ok(classes[best])
            })
            .collect()
    }
}

/// Index and value of the largest entry, first one wins on ties.
pub(crate) fn argmax(row: &[f32]) -> Option<(usize, f32)> {
    row.iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, p)| match best {
            Some((_, bp)) if bp >= p => best,
            _ => Some((i, p)),
        })
}

#[cfg(test)]
mod tests {
    use super::argmax;

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(argmax(&[0.2, 0.8]), Some((1, 0.8)));
        assert_eq!(argmax(&[]), None);
    }
}
