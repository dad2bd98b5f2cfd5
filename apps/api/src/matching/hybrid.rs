//! Ranked career matching: a keyword pre-filter over profile texts, then a
//! cosine re-rank against precomputed profile embeddings.
//!
//! Lifecycle: `Uninitialized → Building → Ready`. `build()` runs once; after
//! that the index is only ever replaced wholesale by an explicit `rebuild()`,
//! and queries keep reading the previous index until the swap.

use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::embeddings::similarity::{cosine_similarity, l2_normalize};
use crate::embeddings::{Embedder, EmbeddingError};
use crate::models::CareerRecord;

const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.35;

/// Tunable operating point of the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridConfig {
    /// Candidates scoring below this are dropped.
    pub similarity_threshold: f32,
    /// When false every career is a candidate and only the threshold filters.
    pub prefilter: bool,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            prefilter: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("semantic index is not ready")]
    NotReady,

    #[error("semantic index is already built; use rebuild() to replace it")]
    AlreadyBuilt,

    #[error("embedding index misaligned: {records} careers but {vectors} vectors")]
    IndexMisaligned { records: usize, vectors: usize },

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Free-text input for the hybrid engine. Either a single `query` or any of
/// the three keyword-form fields; non-blank parts are joined with spaces.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HybridQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub interest: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
}

impl HybridQuery {
    pub fn combined(&self) -> String {
        [&self.query, &self.interest, &self.skills, &self.job]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Externally visible lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    Uninitialized,
    Building,
    Ready,
}

enum EngineState {
    Uninitialized,
    Building,
    Ready(Arc<EmbeddingIndex>),
}

/// Careers, their profile texts and unit-length vectors, index-aligned.
pub struct EmbeddingIndex {
    records: Catalog,
    profiles: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingIndex {
    pub fn new(
        records: Catalog,
        profiles: Vec<String>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, MatchError> {
        if records.len() != vectors.len() || records.len() != profiles.len() {
            return Err(MatchError::IndexMisaligned {
                records: records.len(),
                vectors: vectors.len(),
            });
        }
        Ok(Self {
            records,
            profiles,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Positions whose profile text contains at least one keyword.
    fn prefilter(&self, keywords: &[&str]) -> Vec<usize> {
        self.profiles
            .iter()
            .enumerate()
            .filter(|(_, profile)| keywords.iter().any(|k| profile.contains(*k)))
            .map(|(i, _)| i)
            .collect()
    }
}

/// A career with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredCareer {
    pub record: CareerRecord,
    pub score: f32,
}

pub struct HybridEngine {
    embedder: Arc<dyn Embedder>,
    config: HybridConfig,
    state: RwLock<EngineState>,
}

impl HybridEngine {
    pub fn new(embedder: Arc<dyn Embedder>, config: HybridConfig) -> Self {
        Self {
            embedder,
            config,
            state: RwLock::new(EngineState::Uninitialized),
        }
    }

    pub fn config(&self) -> HybridConfig {
        self.config
    }

    pub fn phase(&self) -> EnginePhase {
        match &*self.state.read() {
            EngineState::Uninitialized => EnginePhase::Uninitialized,
            EngineState::Building => EnginePhase::Building,
            EngineState::Ready(_) => EnginePhase::Ready,
        }
    }

    /// Number of indexed careers, or 0 before the engine is ready.
    pub fn indexed(&self) -> usize {
        match &*self.state.read() {
            EngineState::Ready(index) => index.len(),
            _ => 0,
        }
    }

    /// One-time build: embeds every career profile and moves to `Ready`.
    /// On failure, or if this future is dropped before finishing, the engine
    /// drops back to `Uninitialized`.
    pub async fn build(&self, catalog: Catalog) -> Result<(), MatchError> {
        {
            let mut state = self.state.write();
            if !matches!(*state, EngineState::Uninitialized) {
                return Err(MatchError::AlreadyBuilt);
            }
            *state = EngineState::Building;
        }

        let mut guard = BuildGuard {
            state: &self.state,
            finished: false,
        };
        let index = self.build_index(catalog).await?;
        *self.state.write() = EngineState::Ready(Arc::new(index));
        guard.finished = true;
        Ok(())
    }

    /// Builds a fresh index from `catalog` and swaps it in. The old index keeps
    /// serving until the swap; if the build fails it stays in place.
    #[allow(dead_code)]
    pub async fn rebuild(&self, catalog: Catalog) -> Result<(), MatchError> {
        if !matches!(self.phase(), EnginePhase::Ready) {
            return self.build(catalog).await;
        }
        let index = self.build_index(catalog).await?;
        *self.state.write() = EngineState::Ready(Arc::new(index));
        info!("Semantic index rebuilt");
        Ok(())
    }

    /// Ranked careers for `query`; blank query → empty.
    pub async fn search(&self, query: &str) -> Result<Vec<CareerRecord>, MatchError> {
        Ok(self
            .score(query)
            .await?
            .into_iter()
            .map(|scored| scored.record)
            .collect())
    }

    /// The full pipeline, keeping scores. Sorted by descending score; equal
    /// scores keep catalog order.
    pub async fn score(&self, query: &str) -> Result<Vec<ScoredCareer>, MatchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let index = self.ready_index()?;

        let query = query.to_lowercase();
        let keywords = extract_keywords(&query);

        let candidates = if self.config.prefilter {
            index.prefilter(&keywords)
        } else {
            (0..index.len()).collect()
        };

        if candidates.is_empty() {
            debug!("No careers passed the keyword pre-filter for {:?}", query);
            return Ok(Vec::new());
        }

        let mut query_vector = self.embedder.embed(&query).await?;
        l2_normalize(&mut query_vector);

        let threshold = self.config.similarity_threshold;
        let total_candidates = candidates.len();
        let mut scored: Vec<ScoredCareer> = candidates
            .into_iter()
            .filter_map(|i| {
                let score = cosine_similarity(&query_vector, &index.vectors[i]);
                (score >= threshold).then(|| ScoredCareer {
                    record: index.records[i].clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        debug!(
            candidates = total_candidates,
            kept = scored.len(),
            threshold,
            "Semantic re-rank complete"
        );

        Ok(scored)
    }

    fn ready_index(&self) -> Result<Arc<EmbeddingIndex>, MatchError> {
        match &*self.state.read() {
            EngineState::Ready(index) => Ok(Arc::clone(index)),
            _ => Err(MatchError::NotReady),
        }
    }

    async fn build_index(&self, catalog: Catalog) -> Result<EmbeddingIndex, MatchError> {
        let profiles: Vec<String> = catalog.iter().map(build_profile_text).collect();

        info!(
            "Embedding {} career profiles with '{}'",
            profiles.len(),
            self.embedder.name()
        );

        let mut vectors = if profiles.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&profiles).await?
        };
        vectors.iter_mut().for_each(|v| l2_normalize(v));

        let index = EmbeddingIndex::new(catalog, profiles, vectors)?;
        info!("Semantic index ready: {} careers", index.len());
        Ok(index)
    }
}

/// Resets a `Building` engine to `Uninitialized` unless the build completed.
struct BuildGuard<'a> {
    state: &'a RwLock<EngineState>,
    finished: bool,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.state.write() = EngineState::Uninitialized;
        }
    }
}

/// Required skills (all levels), related skills, category and name, joined by
/// spaces and lowercased.
pub fn build_profile_text(record: &CareerRecord) -> String {
    record
        .all_required_skills()
        .chain(record.related_skills.iter().map(String::as_str))
        .chain([record.category.as_str(), record.name.as_str()])
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Comma-separated, trimmed, non-empty keyword tokens.
fn extract_keywords(query: &str) -> Vec<&str> {
    query
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect()
}
