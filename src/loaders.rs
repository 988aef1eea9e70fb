//! Artifact loading and persistence.
//!
//! Artifacts are JSON documents on the local filesystem:
//!
//! - [`ArtifactFile`] - generic read/write of a single serialized artifact
//! - [`VectorizerLoader`] - loads and saves a fitted [`TfidfVectorizer`]
//! - [`ClassifierLoader`] - loads and saves a fitted [`MultinomialNb`]
//!
//! Writes go to a `.tmp` sibling first and are renamed over the target, so a
//! crash mid-write never leaves a truncated artifact at the configured path.
//!
//! ```rust,no_run
//! use sentiment_service::loaders::{ClassifierLoader, VectorizerLoader};
//!
//! let vectorizer = VectorizerLoader::new("/app/models/vectorizer.pkl").load()?;
//! let classifier = ClassifierLoader::new("/app/models/sentiment_model.pkl").load()?;
//! # Ok::<(), sentiment_service::core::SentimentError>(())
//! ```

use crate::core::{Result, SentimentError};
use crate::models::naive_bayes::ClassifierArtifact;
use crate::models::tfidf::VectorizerArtifact;
use crate::models::{MultinomialNb, TfidfVectorizer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ArtifactFile {
    pub path: PathBuf,
}

impl ArtifactFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn display(&self) -> String {
        self.path.display().to_string()
    }

    /// Sibling file the artifact is written to before being renamed into place.
    pub fn staging_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, source: std::io::Error) -> SentimentError {
        SentimentError::ArtifactIo {
            path: self.display(),
            source,
        }
    }

    pub fn read<T: DeserializeOwned>(&self) -> Result<T> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| SentimentError::ArtifactFormat {
            path: self.display(),
            details: e.to_string(),
        })
    }

    /// Serializes the artifact into [`Self::staging_path`], creating missing
    /// parent directories. The target path is untouched until the returned
    /// [`StagedArtifact`] is committed.
    pub fn stage<T: Serialize>(&self, value: &T) -> Result<StagedArtifact> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let staged = StagedArtifact {
            staging: self.staging_path(),
            target: self.clone(),
            committed: false,
        };
        let file = File::create(&staged.staging).map_err(|e| self.io_error(e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush().map_err(|e| self.io_error(e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| self.io_error(e))?;
        Ok(staged)
    }

    /// Writes the artifact atomically: stage, then rename over the target.
    pub fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        self.stage(value)?.commit()
    }

    /// Deletes the artifact; a missing file is not an error.
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(self.io_error(e)),
            _ => Ok(()),
        }
    }
}

/// A fully written artifact waiting to be renamed into place.
///
/// Dropping it without calling [`StagedArtifact::commit`] deletes the staging
/// file and leaves the target as it was.
#[derive(Debug)]
pub struct StagedArtifact {
    staging: PathBuf,
    target: ArtifactFile,
    committed: bool,
}

impl StagedArtifact {
    pub fn commit(mut self) -> Result<()> {
        std::fs::rename(&self.staging, &self.target.path).map_err(|e| self.target.io_error(e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.staging);
        }
    }
}

#[derive(Debug, Clone)]
pub struct VectorizerLoader {
    pub file: ArtifactFile,
}

impl VectorizerLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: ArtifactFile::new(path.as_ref()),
        }
    }

    pub fn load(&self) -> Result<TfidfVectorizer> {
        let artifact: VectorizerArtifact = self.file.read()?;
        TfidfVectorizer::from_artifact(artifact, &self.file.display())
    }

    pub fn save(&self, vectorizer: &TfidfVectorizer) -> Result<()> {
        self.file.write(&vectorizer.to_artifact())
    }

    pub fn stage(&self, vectorizer: &TfidfVectorizer) -> Result<StagedArtifact> {
        self.file.stage(&vectorizer.to_artifact())
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierLoader {
    pub file: ArtifactFile,
}

impl ClassifierLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: ArtifactFile::new(path.as_ref()),
        }
    }

    pub fn load(&self) -> Result<MultinomialNb> {
        let artifact: ClassifierArtifact = self.file.read()?;
        MultinomialNb::from_artifact(artifact, &self.file.display())
    }

    pub fn save(&self, classifier: &MultinomialNb) -> Result<()> {
        self.file.write(&classifier.to_artifact())
    }

    pub fn stage(&self, classifier: &MultinomialNb) -> Result<StagedArtifact> {
        self.file.stage(&classifier.to_artifact())
    }
}
