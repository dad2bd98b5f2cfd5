//! Embedding backends.
//!
//! The hybrid engine only sees `Arc<dyn Embedder>`; which backend sits behind
//! it is decided once at startup from config.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, EmbeddingBackend};

pub mod hash;
pub mod http;
pub mod similarity;

pub use hash::HashEmbedder;
pub use http::HttpEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding backend returned no vectors")]
    EmptyResponse,

    #[error("invalid embedding config: {0}")]
    Config(String),
}

/// Turns text into fixed-dimension vectors.
///
/// Implementations must be safe to call concurrently; the engine shares one
/// instance across all requests.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Backend label for logs (model name, or "hash").
    fn name(&self) -> &str;

    /// One vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::EmptyResponse)
    }
}

/// Builds the embedder selected by `EMBEDDING_BACKEND`.
pub fn build_embedder(config: &Config) -> Result<Box<dyn Embedder>, EmbeddingError> {
    if config.embedding_dims == 0 {
        return Err(EmbeddingError::Config(
            "EMBEDDING_DIMS must be greater than 0".to_string(),
        ));
    }

    match config.embedding_backend {
        EmbeddingBackend::Http => Ok(Box::new(HttpEmbedder::new(
            &config.embedding_api_url,
            &config.embedding_model,
            config.embedding_api_key.clone(),
        )?)),
        EmbeddingBackend::Hash => Ok(Box::new(HashEmbedder::new(config.embedding_dims))),
    }
}
