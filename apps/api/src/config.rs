use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use crate::embeddings::{hash, http};
use crate::matching::hybrid::HybridConfig;

/// Which `Embedder` implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Http,
    Hash,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "http" => Ok(EmbeddingBackend::Http),
            "hash" => Ok(EmbeddingBackend::Hash),
            other => Err(anyhow!("unknown embedding backend '{other}' (expected http or hash)")),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Every setting has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_dir: PathBuf,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_api_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_dims: usize,
    pub hybrid: HybridConfig,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = HybridConfig::default();

        let config = Config {
            catalog_dir: PathBuf::from(env_or("CATALOG_DIR", "datasets")),
            embedding_backend: parse_env("EMBEDDING_BACKEND", EmbeddingBackend::Http)?,
            embedding_api_url: env_or("EMBEDDING_API_URL", http::DEFAULT_BASE_URL),
            embedding_api_key: std::env::var("EMBEDDING_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            embedding_model: env_or("EMBEDDING_MODEL", http::DEFAULT_MODEL),
            embedding_dims: parse_env("EMBEDDING_DIMS", hash::DEFAULT_DIMS)?,
            hybrid: HybridConfig {
                similarity_threshold: parse_env(
                    "SIMILARITY_THRESHOLD",
                    defaults.similarity_threshold,
                )?,
                prefilter: parse_env("HYBRID_PREFILTER", defaults.prefilter)?,
            },
            port: parse_env("PORT", 5000)?,
            rust_log: env_or("RUST_LOG", "info"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that parse but would leave the engine unable to match.
    fn validate(&self) -> Result<()> {
        let threshold = self.hybrid.similarity_threshold;
        if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
            bail!("SIMILARITY_THRESHOLD must be a number between -1 and 1, got {threshold}");
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("http".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Http);
        assert_eq!(" HASH ".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Hash);
        assert_eq!("".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Http);
        assert!("onnx".parse::<EmbeddingBackend>().is_err());
    }

    fn config_with_threshold(similarity_threshold: f32) -> Config {
        Config {
            catalog_dir: PathBuf::from("datasets"),
            embedding_backend: EmbeddingBackend::Hash,
            embedding_api_url: http::DEFAULT_BASE_URL.to_string(),
            embedding_api_key: None,
            embedding_model: http::DEFAULT_MODEL.to_string(),
            embedding_dims: hash::DEFAULT_DIMS,
            hybrid: HybridConfig {
                similarity_threshold,
                prefilter: true,
            },
            port: 5000,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_cosine_range() {
        assert!(config_with_threshold(0.35).validate().is_ok());
        assert!(config_with_threshold(-1.0).validate().is_ok());
        assert!(config_with_threshold(1.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite_threshold() {
        // "NaN" and "inf" both parse as f32.
        let nan: f32 = "NaN".parse().unwrap();
        let err = config_with_threshold(nan).validate().unwrap_err();
        assert!(err.to_string().contains("SIMILARITY_THRESHOLD"));
        assert!(config_with_threshold(f32::INFINITY).validate().is_err());
        assert!(config_with_threshold(1.5).validate().is_err());
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: f32 = parse_env("CAREERMATCH_TEST_UNSET_THRESHOLD", 0.35).unwrap();
        assert_eq!(value, 0.35);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("CAREERMATCH_TEST_BAD_PORT", "eighty");
        let result: Result<u16> = parse_env("CAREERMATCH_TEST_BAD_PORT", 5000);
        std::env::remove_var("CAREERMATCH_TEST_BAD_PORT");
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("CAREERMATCH_TEST_BAD_PORT"));
    }

    #[test]
    fn test_parse_env_reads_bool_and_float() {
        std::env::set_var("CAREERMATCH_TEST_PREFILTER", "false");
        std::env::set_var("CAREERMATCH_TEST_THRESHOLD", " 0.5 ");
        let prefilter: bool = parse_env("CAREERMATCH_TEST_PREFILTER", true).unwrap();
        let threshold: f32 = parse_env("CAREERMATCH_TEST_THRESHOLD", 0.35).unwrap();
        std::env::remove_var("CAREERMATCH_TEST_PREFILTER");
        std::env::remove_var("CAREERMATCH_TEST_THRESHOLD");
        assert!(!prefilter);
        assert_eq!(threshold, 0.5);
    }
}
