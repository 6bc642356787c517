use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{Document, NodeKind, TitleCount};

/// A stored structured document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outline {
    pub id: Uuid,
    pub title: String,
    /// The report this outline was imported from, if any.
    pub report_id: Option<Uuid>,
    pub document: Document,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry for outlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineSummary {
    pub id: Uuid,
    pub title: String,
    pub report_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl From<Outline> for OutlineSummary {
    fn from(outline: Outline) -> Self {
        Self {
            id: outline.id,
            title: outline.title,
            report_id: outline.report_id,
            updated_at: outline.updated_at,
        }
    }
}

/// Input for creating an outline, optionally seeded from Markdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOutlineInput {
    pub title: String,
    #[serde(default)]
    pub markdown: Option<String>,
}

/// Input for appending a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSectionInput {
    pub kind: NodeKind,
    pub text: String,
    /// Parent node. `None` appends under the root.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSectionResponse {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTextInput {
    pub text: String,
}

/// A one-line outline command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineCommandInput {
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineCommandResponse {
    pub reply: String,
}

/// Structural totals for an outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineStats {
    #[serde(flatten)]
    pub headings: TitleCount,
    pub nodes: usize,
    pub characters: usize,
}

impl OutlineStats {
    pub fn of(doc: &Document) -> Self {
        Self {
            headings: doc.count_titles(),
            nodes: doc.len(),
            characters: doc.get_character_count(doc.root_id()),
        }
    }
}
