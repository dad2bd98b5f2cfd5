//! HTTP embedding client for Hugging Face style feature-extraction endpoints.
//!
//! Sends `{"inputs": [...]}` to `{base_url}/{model}` and accepts either one
//! pooled vector per input or per-token vectors, which are mean-pooled here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embeddings::{Embedder, EmbeddingError};

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/pipeline/feature-extraction";
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
const MAX_RETRIES: u32 = 3;
const BATCH_SIZE: usize = 64;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Pooled(Vec<Vec<f32>>),
    Tokens(Vec<Vec<Vec<f32>>>),
}

impl FeatureExtractionResponse {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            FeatureExtractionResponse::Pooled(vectors) => vectors,
            FeatureExtractionResponse::Tokens(per_input) => {
                per_input.into_iter().map(|tokens| mean_pool(&tokens)).collect()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpEmbedder {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Result<Self, EmbeddingError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), model),
            api_key,
            model: model.to_string(),
        })
    }

    #[allow(dead_code)]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One request for one chunk of inputs.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = FeatureExtractionRequest {
            inputs,
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&self.endpoint).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbeddingError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Embedding API returned {}: {}", status, body);
                last_error = Some(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorBody>(&body)
                    .map(|e| e.error)
                    .unwrap_or(body);
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let text = response.text().await?;
            let parsed: FeatureExtractionResponse = serde_json::from_str(&text)?;
            let vectors = parsed.into_vectors();

            if vectors.len() != inputs.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: inputs.len(),
                    actual: vectors.len(),
                });
            }

            debug!(
                "Embedding call succeeded: model={}, inputs={}",
                self.model,
                inputs.len()
            );

            return Ok(vectors);
        }

        Err(last_error.unwrap_or(EmbeddingError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            vectors.extend(self.request(chunk).await?);
        }
        Ok(vectors)
    }
}

/// Averages per-token vectors into one sentence vector.
fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = tokens.first() else {
        return Vec::new();
    };
    let mut pooled = vec![0.0_f32; first.len()];
    for token in tokens {
        for (acc, x) in pooled.iter_mut().zip(token) {
            *acc += x;
        }
    }
    let count = tokens.len() as f32;
    pooled.iter_mut().for_each(|x| *x /= count);
    pooled
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Echoes one 2-dim vector per input: [input length, 1.0].
    async fn pooled_handler(Json(body): Json<Value>) -> Json<Value> {
        let vectors: Vec<Value> = body["inputs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|input| json!([input.as_str().unwrap().len() as f32, 1.0]))
            .collect();
        Json(Value::Array(vectors))
    }

    #[test]
    fn test_pooled_response_passes_through() {
        let parsed: FeatureExtractionResponse =
            serde_json::from_str("[[0.1, 0.2], [0.3, 0.4]]").unwrap();
        assert_eq!(parsed.into_vectors(), vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn test_token_response_is_mean_pooled() {
        let parsed: FeatureExtractionResponse =
            serde_json::from_str("[[[1.0, 0.0], [3.0, 2.0]]]").unwrap();
        assert_eq!(parsed.into_vectors(), vec![vec![2.0, 1.0]]);
    }

    #[test]
    fn test_mean_pool_empty_tokens() {
        assert!(mean_pool(&[]).is_empty());
    }

    #[test]
    fn test_endpoint_joins_base_and_model() {
        let embedder = HttpEmbedder::new("http://localhost:9000/", "org/model", None).unwrap();
        assert_eq!(embedder.endpoint(), "http://localhost:9000/org/model");
        assert_eq!(embedder.name(), "org/model");
    }

    #[tokio::test]
    async fn test_embed_batch_against_local_server() {
        let app = Router::new().route("/test/model", post(pooled_handler));
        let base = spawn_server(app).await;
        let embedder = HttpEmbedder::new(&base, "test/model", Some("token".to_string())).unwrap();

        let texts = vec!["abc".to_string(), "abcdef".to_string()];
        let vectors = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors, vec![vec![3.0, 1.0], vec![6.0, 1.0]]);

        let single = embedder.embed("ab").await.unwrap();
        assert_eq!(single, vec![2.0, 1.0]);
    }

    #[tokio::test]
    async fn test_large_batches_are_chunked() {
        let app = Router::new().route("/m", post(pooled_handler));
        let base = spawn_server(app).await;
        let embedder = HttpEmbedder::new(&base, "m", None).unwrap();

        let texts: Vec<String> = (0..BATCH_SIZE * 2 + 5).map(|i| "x".repeat(i % 7)).collect();
        let vectors = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), texts.len());
        assert_eq!(vectors[BATCH_SIZE + 3][0], ((BATCH_SIZE + 3) % 7) as f32);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let app = Router::new().route(
            "/m",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Model m does not exist" })),
                )
            }),
        );
        let base = spawn_server(app).await;
        let embedder = HttpEmbedder::new(&base, "m", None).unwrap();

        let err = embedder.embed("hello").await.unwrap_err();
        match err {
            EmbeddingError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Model m does not exist");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_vector_count_is_rejected() {
        let app = Router::new().route("/m", post(|| async { Json(json!([[1.0, 2.0]])) }));
        let base = spawn_server(app).await;
        let embedder = HttpEmbedder::new(&base, "m", None).unwrap();

        let texts = vec!["a".to_string(), "b".to_string()];
        let err = embedder.embed_batch(&texts).await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::CountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }
}
