//! Request types for MCP tools. Responses reuse the HTTP models.

use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AssistantTurnRequest {
    #[schemars(description = "Opaque conversation id; a new id starts a new conversation")]
    pub session_id: String,
    #[schemars(description = "The user's message for this turn")]
    pub message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetConversationRequest {
    #[schemars(description = "The conversation id")]
    pub session_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunOutlineCommandRequest {
    #[schemars(description = "The UUID of the outline")]
    pub outline_id: String,
    #[schemars(
        description = "One-line command in English or Spanish, e.g. 'how many titles and subtitles are there', 'how many characters does the summary have', 'can you modify the text of conclusions', 'delete the section introduction'"
    )]
    pub command: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenderOutlineRequest {
    #[schemars(description = "The UUID of the outline")]
    pub outline_id: String,
    #[schemars(description = "'tree' (default) for an ASCII outline, or 'markdown'")]
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListReportsRequest {
    #[schemars(description = "Maximum number of reports to return, newest first")]
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetReportRequest {
    #[schemars(description = "The UUID of the report")]
    pub report_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchReportsRequest {
    #[schemars(description = "Free-text query to rank stored material against")]
    pub query: String,
    #[schemars(description = "Number of results (default 5)")]
    #[serde(default)]
    pub k: Option<usize>,
    #[schemars(description = "'reports' (default), 'references' or 'all'")]
    #[serde(default)]
    pub scope: Option<String>,
}

/// Output of `run_outline_command`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutlineCommandResult {
    pub reply: String,
    pub stats: crate::models::OutlineStats,
}
