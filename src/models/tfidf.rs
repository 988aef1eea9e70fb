//! TF-IDF text vectorizer.
//!
//! Text is lowercased and split into word tokens of at least two characters.
//! Each row of the output matrix holds raw term counts weighted by the
//! smoothed inverse document frequency `ln((1 + n) / (1 + df)) + 1` and is
//! scaled to unit L2 norm.

use super::Vectorizer;
use crate::core::{Result, SentimentError};
use candle_core::{Device, Tensor};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"));

pub const VECTORIZER_KIND: &str = "tfidf";

/// Lowercases `text` and returns its word tokens in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Serialized form of a fitted [`TfidfVectorizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub kind: String,
    pub vocabulary: Vec<String>,
    pub idf: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f32>,
    device: Device,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and idf weights from `docs`.
    ///
    /// With `max_features` set, only the terms with the highest corpus
    /// frequency are kept; ties go to the lexicographically smaller term.
    pub fn fit(docs: &[String], max_features: Option<usize>) -> Result<Self> {
        if docs.is_empty() {
            return Err(SentimentError::Training(
                "cannot fit a vectorizer on zero documents".into(),
            ));
        }

        // term -> (corpus frequency, document frequency)
        let mut stats: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for doc in docs {
            let tokens = tokenize(doc);
            let unique: HashSet<&String> = tokens.iter().collect();
            for term in &unique {
                stats.entry((*term).clone()).or_default().1 += 1;
            }
            for term in tokens.iter() {
                stats.entry(term.clone()).or_default().0 += 1;
            }
        }

        if stats.is_empty() {
            return Err(SentimentError::Training(
                "empty vocabulary; documents contain no word tokens".into(),
            ));
        }

        let mut terms: Vec<(String, usize, usize)> = stats
            .into_iter()
            .map(|(term, (tf, df))| (term, tf, df))
            .collect();

        if let Some(limit) = max_features {
            if terms.len() > limit {
                // stable sort keeps lexicographic order among equal counts
                terms.sort_by(|a, b| b.1.cmp(&a.1));
                terms.truncate(limit);
                terms.sort_by(|a, b| a.0.cmp(&b.0));
            }
        }

        let n_docs = docs.len() as f32;
        let idf = terms
            .iter()
            .map(|(_, _, df)| ((1.0 + n_docs) / (1.0 + *df as f32)).ln() + 1.0)
            .collect();
        let vocabulary = terms.into_iter().map(|(term, _, _)| term).collect();

        Ok(Self::from_parts(vocabulary, idf))
    }

    fn from_parts(vocabulary: Vec<String>, idf: Vec<f32>) -> Self {
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        Self {
            vocabulary,
            index,
            idf,
            device: Device::Cpu,
        }
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn to_artifact(&self) -> VectorizerArtifact {
        VectorizerArtifact {
            kind: VECTORIZER_KIND.to_string(),
            vocabulary: self.vocabulary.clone(),
            idf: self.idf.clone(),
        }
    }

    /// Rebuilds a vectorizer from its artifact. `source` names the artifact
    /// in error messages.
    pub fn from_artifact(artifact: VectorizerArtifact, source: &str) -> Result<Self> {
        let invalid = |details: String| SentimentError::ArtifactFormat {
            path: source.to_string(),
            details,
        };

        if artifact.kind != VECTORIZER_KIND {
            return Err(invalid(format!(
                "expected kind '{VECTORIZER_KIND}', found '{}'",
                artifact.kind
            )));
        }
        if artifact.vocabulary.is_empty() {
            return Err(invalid("vocabulary is empty".into()));
        }
        if artifact.vocabulary.len() != artifact.idf.len() {
            return Err(invalid(format!(
                "vocabulary has {} terms but idf has {} weights",
                artifact.vocabulary.len(),
                artifact.idf.len()
            )));
        }

        Ok(Self::from_parts(artifact.vocabulary, artifact.idf))
    }

    fn row(&self, text: &str) -> Vec<f32> {
        let mut row = vec![0f32; self.vocabulary.len()];
        for token in tokenize(text) {
            if let Some(&col) = self.index.get(&token) {
                row[col] += 1.0;
            }
        }
        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.iter_mut().for_each(|v| *v /= norm);
        }
        row
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, texts: &[String]) -> Result<Tensor> {
        let width = self.vocabulary.len();
        let data: Vec<f32> = texts.iter().flat_map(|text| self.row(text)).collect();
        Ok(Tensor::from_vec(data, (texts.len(), width), &self.device)?)
    }

    fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    fn feature_names(&self) -> &[String] {
        &self.vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tokenize_lowercases_and_drops_short_tokens() {
        assert_eq!(
            tokenize("I LOVE this, it's a 10/10!"),
            vec!["love", "this", "it", "10", "10"]
        );
    }

    #[test]
    fn test_fit_builds_sorted_vocabulary() {
        let v = TfidfVectorizer::fit(&docs(&["good movie", "bad movie"]), None).unwrap();
        assert_eq!(v.feature_names(), &["bad", "good", "movie"]);

        // "movie" appears in every document, so it gets the minimum idf of 1.0
        let idf = v.idf();
        assert!((idf[2] - 1.0).abs() < 1e-6);
        assert!(idf[0] > idf[2]);
        assert!((idf[0] - idf[1]).abs() < 1e-6);
    }

    #[test]
    fn test_max_features_keeps_most_frequent_terms() {
        let v = TfidfVectorizer::fit(
            &docs(&["apple apple banana", "apple cherry", "cherry date"]),
            Some(2),
        )
        .unwrap();
        assert_eq!(v.feature_names(), &["apple", "cherry"]);
    }

    #[test]
    fn test_transform_rows_are_unit_norm() {
        let v = TfidfVectorizer::fit(&docs(&["good movie", "bad movie"]), None).unwrap();
        let x = v
            .transform(&docs(&["good good movie", "nothing known here"]))
            .unwrap();
        assert_eq!(x.dims(), &[2, 3]);

        let rows = x.to_vec2::<f32>().unwrap();
        let norm: f32 = rows[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert_eq!(rows[0][0], 0.0);
        assert!(rows[0][1] > rows[0][2]);
        assert!(rows[1].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_fit_rejects_documents_without_tokens() {
        let err = TfidfVectorizer::fit(&docs(&["a", "!"]), None).unwrap_err();
        assert!(matches!(err, SentimentError::Training(_)));
    }

    #[test]
    fn test_artifact_validation() {
        let v = TfidfVectorizer::fit(&docs(&["good movie"]), None).unwrap();
        let mut artifact = v.to_artifact();
        assert!(TfidfVectorizer::from_artifact(artifact.clone(), "vec.json").is_ok());

        artifact.idf.pop();
        let err = TfidfVectorizer::from_artifact(artifact, "vec.json").unwrap_err();
        assert!(matches!(err, SentimentError::ArtifactFormat { .. }));
    }
}
