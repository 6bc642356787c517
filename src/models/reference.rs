use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source material uploaded to ground generated reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Input for uploading a reference document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReferenceInput {
    pub name: String,
    pub content: String,
}

/// Upload result: the stored document and how many chunks were indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceUploadResponse {
    pub document: ReferenceDocument,
    pub indexed_chunks: usize,
}

/// One indexed chunk of a report or reference document.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub source: super::SourceKind,
    pub owner_id: Uuid,
    pub chunk_index: usize,
    pub content: String,
    pub vector: Vec<f32>,
}
