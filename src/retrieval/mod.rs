//! Semantic retrieval over report history and reference documents.
//!
//! Text is split into chunks, each chunk is embedded and stored in the
//! `embeddings` table, and queries are ranked by cosine similarity against every
//! stored vector of the requested scope. The vector index is small enough that a
//! linear scan is fine.

mod ollama;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{
    EmbeddingRecord, ReferenceDocument, Report, SearchHit, SearchQuery, SearchScope, SourceKind,
};

pub use ollama::{OllamaEmbedder, DEFAULT_EMBEDDING_MODEL};

pub const MAX_CHUNK_CHARS: usize = 1000;
pub const SNIPPET_CHARS: usize = 200;

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"));

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Embedding model unavailable")]
    Unavailable,

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Turns text into a vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> String;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

#[derive(Clone)]
pub enum EmbedderHandle {
    Available(Arc<dyn Embedder>),
    Unavailable,
}

impl EmbedderHandle {
    pub fn new(embedder: impl Embedder + 'static) -> Self {
        Self::Available(Arc::new(embedder))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    fn model_name(&self) -> String {
        match self {
            Self::Available(embedder) => embedder.model_name(),
            Self::Unavailable => String::new(),
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        match self {
            Self::Available(embedder) => embedder.embed(text).await,
            Self::Unavailable => Err(RetrievalError::Unavailable),
        }
    }
}

/// Split text on blank lines into chunks of at most `max_chars` characters.
///
/// Paragraphs are packed together while they fit; a single paragraph longer
/// than `max_chars` is cut into fixed-size pieces.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in BLANK_LINE.split(text).map(str::trim).filter(|p| !p.is_empty()) {
        let len = paragraph.chars().count();
        let current_len = current.chars().count();

        if !current.is_empty() && current_len + 2 + len <= max_chars {
            current.push_str("\n\n");
            current.push_str(paragraph);
            continue;
        }
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if len <= max_chars {
            current.push_str(paragraph);
        } else {
            let chars: Vec<char> = paragraph.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Cosine similarity; `0.0` for mismatched or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

fn scope_filter(scope: SearchScope) -> Option<SourceKind> {
    match scope {
        SearchScope::Reports => Some(SourceKind::Report),
        SearchScope::References => Some(SourceKind::Reference),
        SearchScope::All => None,
    }
}

#[derive(Clone)]
pub struct Retriever {
    db: Database,
    embedder: EmbedderHandle,
}

impl Retriever {
    pub fn new(db: Database, embedder: EmbedderHandle) -> Self {
        Self { db, embedder }
    }

    pub fn is_available(&self) -> bool {
        self.embedder.is_available()
    }

    pub async fn index_report(&self, report: &Report) -> Result<usize, RetrievalError> {
        self.index(SourceKind::Report, report.id, &report.content).await
    }

    pub async fn index_reference(
        &self,
        document: &ReferenceDocument,
    ) -> Result<usize, RetrievalError> {
        self.index(SourceKind::Reference, document.id, &document.content)
            .await
    }

    async fn index(
        &self,
        source: SourceKind,
        owner_id: Uuid,
        content: &str,
    ) -> Result<usize, RetrievalError> {
        let mut records = Vec::new();
        for (chunk_index, chunk) in chunk_text(content, MAX_CHUNK_CHARS).into_iter().enumerate() {
            let vector = self.embedder.embed(&chunk).await?;
            records.push(EmbeddingRecord {
                source,
                owner_id,
                chunk_index,
                content: chunk,
                vector,
            });
        }

        self.db
            .replace_embeddings(source, owner_id, &records, &self.embedder.model_name())?;
        tracing::debug!(
            source = source.as_str(),
            %owner_id,
            chunks = records.len(),
            "Indexed content"
        );
        Ok(records.len())
    }

    /// Best-scoring chunk per owner, highest first.
    async fn rank(
        &self,
        query: &str,
        scope: SearchScope,
    ) -> Result<Vec<(EmbeddingRecord, f32)>, RetrievalError> {
        let query_vector = self.embedder.embed(query).await?;

        let mut best: HashMap<(SourceKind, Uuid), (EmbeddingRecord, f32)> = HashMap::new();
        for record in self.db.get_embeddings(scope_filter(scope))? {
            let score = cosine_similarity(&query_vector, &record.vector);
            let key = (record.source, record.owner_id);
            let better = best
                .get(&key)
                .map_or(true, |(_, existing)| score > *existing);
            if better {
                best.insert(key, (record, score));
            }
        }

        let mut ranked: Vec<_> = best.into_values().collect();
        ranked.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.0.owner_id.cmp(&b.0.owner_id))
        });
        Ok(ranked)
    }

    /// Rank stored material against `query`. An unavailable embedder yields no hits.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, RetrievalError> {
        let ranked = match self.rank(&query.query, query.scope).await {
            Ok(ranked) => ranked,
            Err(RetrievalError::Unavailable) => {
                tracing::warn!("Search requested without an embedding model");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut hits = Vec::new();
        for (record, score) in ranked {
            if hits.len() >= query.k {
                break;
            }
            let hit = match record.source {
                SourceKind::Report => self.db.get_report(record.owner_id)?.map(|report| SearchHit {
                    id: report.id,
                    source: SourceKind::Report,
                    title: report.topic,
                    kind: Some(report.kind),
                    created_at: report.created_at,
                    score,
                    snippet: snippet(&report.content),
                }),
                SourceKind::Reference => {
                    self.db
                        .get_reference(record.owner_id)?
                        .map(|document| SearchHit {
                            id: document.id,
                            source: SourceKind::Reference,
                            title: document.name,
                            kind: None,
                            created_at: document.created_at,
                            score,
                            snippet: snippet(&record.content),
                        })
                }
            };
            hits.extend(hit);
        }
        Ok(hits)
    }

    /// Snippets for prompt grounding. Failures degrade to no context.
    pub async fn context_for(&self, query: &str, k: usize) -> Vec<String> {
        if k == 0 || !self.embedder.is_available() {
            return Vec::new();
        }
        match self.rank(query, SearchScope::All).await {
            Ok(ranked) => ranked
                .into_iter()
                .take(k)
                .map(|(record, _)| record.content)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Context retrieval failed, continuing without context");
                Vec::new()
            }
        }
    }

    /// Embed every stored report that has no vector yet.
    pub async fn sync_reports(&self) -> Result<usize, RetrievalError> {
        if !self.embedder.is_available() {
            return Err(RetrievalError::Unavailable);
        }
        let mut indexed = 0;
        for report in self.db.get_all_reports()? {
            if self.db.has_embeddings(SourceKind::Report, report.id)? {
                continue;
            }
            self.index_report(&report).await?;
            indexed += 1;
        }
        tracing::info!(indexed, "Report index synchronized");
        Ok(indexed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_pack_paragraphs() {
        let text = "alpha\n\nbeta\n  \ngamma";
        assert_eq!(chunk_text(text, 1000), vec!["alpha\n\nbeta\n\ngamma"]);
        assert_eq!(chunk_text(text, 12), vec!["alpha\n\nbeta", "gamma"]);
    }

    #[test]
    fn long_paragraph_is_cut() {
        let text = "x".repeat(2500);
        let chunks = chunk_text(&text, 1000);
        assert_eq!(
            chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
            vec![1000, 1000, 500]
        );
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(chunk_text("  \n\n \n", 1000).is_empty());
    }

    #[test]
    fn cosine_edge_cases() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn snippet_counts_characters() {
        let text = "é".repeat(300);
        assert_eq!(snippet(&text).chars().count(), SNIPPET_CHARS);
    }
}
