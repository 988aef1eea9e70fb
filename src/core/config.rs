//! Runtime configuration read from the process environment.

use super::error::{Result, SentimentError};
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "/app/models/sentiment_model.pkl";
pub const DEFAULT_VECTORIZER_PATH: &str = "/app/models/vectorizer.pkl";
pub const DEFAULT_MODEL_VERSION: &str = "1.0.0";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// Snapshot of the settings the service consumes at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub vectorizer_path: PathBuf,
    pub model_version: String,
    pub host: String,
    pub port: u16,
}

impl ServiceConfig {
    /// Reads `MODEL_PATH`, `VECTORIZER_PATH`, `MODEL_VERSION`, `HOST` and `PORT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup, falling back to
    /// the defaults for every missing key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| SentimentError::Config {
                key: "PORT".to_string(),
                details: format!("'{raw}' is not a valid port: {e}"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            model_path: PathBuf::from(env_or("MODEL_PATH", DEFAULT_MODEL_PATH)),
            vectorizer_path: PathBuf::from(env_or("VECTORIZER_PATH", DEFAULT_VECTORIZER_PATH)),
            model_version: env_or("MODEL_VERSION", DEFAULT_MODEL_VERSION),
            host: env_or("HOST", DEFAULT_HOST),
            port,
        })
    }

    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            vectorizer_path: PathBuf::from(DEFAULT_VECTORIZER_PATH),
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        let cfg = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, ServiceConfig::default());
        assert_eq!(cfg.model_path, PathBuf::from("/app/models/sentiment_model.pkl"));
        assert_eq!(cfg.vectorizer_path, PathBuf::from("/app/models/vectorizer.pkl"));
        assert_eq!(cfg.model_version, "1.0.0");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_overrides_are_applied() {
        let cfg = ServiceConfig::from_lookup(lookup_from(&[
            ("MODEL_PATH", "/tmp/m.json"),
            ("VECTORIZER_PATH", "/tmp/v.json"),
            ("MODEL_VERSION", "2.3.4"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(cfg.model_path, PathBuf::from("/tmp/m.json"));
        assert_eq!(cfg.vectorizer_path, PathBuf::from("/tmp/v.json"));
        assert_eq!(cfg.model_version, "2.3.4");
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, SentimentError::Config { ref key, .. } if key == "PORT"));
    }
}
