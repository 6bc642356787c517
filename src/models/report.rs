use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Language;

/// A generated report kept in the history.
///
/// Reports are immutable once stored; the only lifecycle operation after
/// creation is deletion, which also drops the report's search vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub topic: String,
    /// Free-form report type, e.g. "technical" or "executive summary".
    pub kind: String,
    pub content: String,
    pub purpose: Option<String>,
    pub style: Option<String>,
    pub pages: Option<u32>,
    pub extras: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// History listing entry, without the content body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: Uuid,
    pub topic: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl From<Report> for ReportSummary {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            topic: report.topic,
            kind: report.kind,
            created_at: report.created_at,
        }
    }
}

/// Parameters for generating a report.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerateReportInput {
    /// Required. Accepted empty on the wire so the caller gets a 400, not a 422.
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub extras: Option<String>,
    /// Report language. Defaults to the configured language.
    #[serde(default)]
    pub language: Option<Language>,
}

pub fn default_kind() -> String {
    "report".to_string()
}

/// Returned after a report was generated and stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReportResponse {
    pub id: Uuid,
    pub content: String,
}

/// Input for storing an already generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReportInput {
    pub topic: String,
    pub kind: String,
    pub content: String,
    pub purpose: Option<String>,
    pub style: Option<String>,
    pub pages: Option<u32>,
    pub extras: Option<String>,
}

/// Markdown to convert into a downloadable document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportInput {
    pub content: String,
    /// `docx` or `pdf`.
    pub format: String,
}

/// Optional `?export=` / `?format=` query on document endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportQuery {
    #[serde(default, alias = "format")]
    pub export: Option<String>,
}

/// Which indexed material a search ranks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    Reports,
    References,
    All,
}

/// Origin of an indexed vector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Report,
    Reference,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Reference => "reference",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "report" => Some(Self::Report),
            "reference" => Some(Self::Reference),
            _ => None,
        }
    }
}

/// Query for semantic search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub scope: SearchScope,
}

fn default_k() -> usize {
    5
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub source: SourceKind,
    /// Report topic or reference document name.
    pub title: String,
    pub kind: Option<String>,
    pub created_at: DateTime<Utc>,
    pub score: f32,
    /// First 200 characters of the content.
    pub snippet: String,
}
