//! MCP server exposing the drafting assistant and outline tools over stdio.

mod types;

pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use uuid::Uuid;

use crate::document::{command::CommandInterpreter, render};
use crate::models::*;
use crate::retrieval::RetrievalError;
use crate::state::AppState;

#[derive(Clone)]
pub struct McpServer {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

fn storage_error(e: impl std::fmt::Display) -> McpError {
    McpError::internal_error(e.to_string(), None)
}

fn json_result(value: &impl Serialize) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(storage_error)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

impl McpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    fn parse_uuid(s: &str) -> Result<Uuid, McpError> {
        Uuid::parse_str(s)
            .map_err(|e| McpError::invalid_params(format!("Invalid UUID: {}", e), None))
    }

    fn parse_scope(scope: Option<&str>) -> Result<SearchScope, McpError> {
        match scope.map(str::trim) {
            None | Some("") | Some("reports") => Ok(SearchScope::Reports),
            Some("references") => Ok(SearchScope::References),
            Some("all") => Ok(SearchScope::All),
            Some(other) => Err(McpError::invalid_params(
                format!("Unknown scope '{}': use reports, references or all", other),
                None,
            )),
        }
    }

    // ============================================================
    // Tool logic, shared by the tools and the test helpers
    // ============================================================

    async fn do_assistant_turn(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<TurnReply, McpError> {
        if session_id.trim().is_empty() {
            return Err(McpError::invalid_params("session_id is empty", None));
        }
        Ok(self.state.assistant.handle_turn(session_id, message).await)
    }

    async fn do_get_conversation(&self, session_id: &str) -> Result<ConversationState, McpError> {
        self.state
            .assistant
            .conversation(session_id)
            .await
            .ok_or_else(|| McpError::invalid_params("Conversation not found", None))
    }

    fn do_run_outline_command(
        &self,
        outline_id: &str,
        command: &str,
    ) -> Result<OutlineCommandResult, McpError> {
        let outline_id = Self::parse_uuid(outline_id)?;
        let interpreter = CommandInterpreter::new(self.state.default_language);

        self.state
            .db
            .with_outline_mut(outline_id, |doc| OutlineCommandResult {
                reply: interpreter.interpret(doc, command),
                stats: OutlineStats::of(doc),
            })
            .map_err(storage_error)?
            .ok_or_else(|| McpError::invalid_params("Outline not found", None))
    }

    fn do_render_outline(
        &self,
        outline_id: &str,
        format: Option<&str>,
    ) -> Result<String, McpError> {
        let outline_id = Self::parse_uuid(outline_id)?;
        let outline = self
            .state
            .db
            .get_outline(outline_id)
            .map_err(storage_error)?
            .ok_or_else(|| McpError::invalid_params("Outline not found", None))?;

        match format.unwrap_or("tree") {
            "tree" => Ok(render::render_outline(&outline.document, &outline.title)),
            "markdown" | "md" => Ok(render::render_markdown(&outline.document)),
            other => Err(McpError::invalid_params(
                format!("Unknown format '{}': use tree or markdown", other),
                None,
            )),
        }
    }

    fn do_list_reports(&self, limit: Option<usize>) -> Result<Vec<ReportSummary>, McpError> {
        let reports = self.state.db.get_all_reports().map_err(storage_error)?;
        Ok(reports
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(ReportSummary::from)
            .collect())
    }

    fn do_get_report(&self, report_id: &str) -> Result<Report, McpError> {
        let report_id = Self::parse_uuid(report_id)?;
        self.state
            .db
            .get_report(report_id)
            .map_err(storage_error)?
            .ok_or_else(|| McpError::invalid_params("Report not found", None))
    }

    async fn do_search_reports(
        &self,
        query: &str,
        k: Option<usize>,
        scope: Option<&str>,
    ) -> Result<Vec<SearchHit>, McpError> {
        if query.trim().is_empty() {
            return Err(McpError::invalid_params("Search query is empty", None));
        }
        let query = SearchQuery {
            query: query.to_string(),
            k: k.unwrap_or(5),
            scope: Self::parse_scope(scope)?,
        };
        self.state
            .retriever
            .search(&query)
            .await
            .map_err(|e| match e {
                RetrievalError::Storage(e) => storage_error(e),
                other => McpError::internal_error(other.to_string(), None),
            })
    }

    // ============================================================
    // Test helpers - expose tool logic for testing
    // ============================================================

    pub async fn test_assistant_turn(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<TurnReply, McpError> {
        self.do_assistant_turn(session_id, message).await
    }

    pub async fn test_get_conversation(
        &self,
        session_id: &str,
    ) -> Result<ConversationState, McpError> {
        self.do_get_conversation(session_id).await
    }

    pub fn test_run_outline_command(
        &self,
        outline_id: &str,
        command: &str,
    ) -> Result<OutlineCommandResult, McpError> {
        self.do_run_outline_command(outline_id, command)
    }

    pub fn test_render_outline(
        &self,
        outline_id: &str,
        format: Option<&str>,
    ) -> Result<String, McpError> {
        self.do_render_outline(outline_id, format)
    }

    pub fn test_list_reports(&self, limit: Option<usize>) -> Result<Vec<ReportSummary>, McpError> {
        self.do_list_reports(limit)
    }

    pub fn test_get_report(&self, report_id: &str) -> Result<Report, McpError> {
        self.do_get_report(report_id)
    }

    pub async fn test_search_reports(
        &self,
        query: &str,
        k: Option<usize>,
        scope: Option<&str>,
    ) -> Result<Vec<SearchHit>, McpError> {
        self.do_search_reports(query, k, scope).await
    }
}

#[tool_router]
impl McpServer {
    #[tool(
        description = "Send one user message to the report-drafting assistant. The first call for a new session_id opens the conversation and returns the opening question. The assistant asks, in order, for purpose, topic, style, page count (1-30) and extras, then proposes a section structure to confirm with yes/no. Returns: reply text, current step (0-6), and when finished the collected context."
    )]
    async fn assistant_turn(
        &self,
        params: Parameters<AssistantTurnRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let reply = self.do_assistant_turn(&req.session_id, &req.message).await?;
        json_result(&reply)
    }

    #[tool(
        description = "Read the collected state of a conversation: step, purpose, topic, style, pages, extras, proposed structure and language."
    )]
    async fn get_conversation(
        &self,
        params: Parameters<GetConversationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.do_get_conversation(&params.0.session_id).await?;
        json_result(&state)
    }

    #[tool(
        description = "Run a one-line natural-language command against a stored outline: count headings, count the characters of a section, clear a section's text, or delete a section with its descendants. Unrecognised commands are answered with 'Command not recognized.' Side effect: the outline is saved after the command."
    )]
    async fn run_outline_command(
        &self,
        params: Parameters<RunOutlineCommandRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let result = self.do_run_outline_command(&req.outline_id, &req.command)?;
        json_result(&result)
    }

    #[tool(description = "Render a stored outline as an ASCII tree or as Markdown.")]
    async fn render_outline(
        &self,
        params: Parameters<RenderOutlineRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.do_render_outline(&req.outline_id, req.format.as_deref())?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "List generated reports, newest first, without their content.")]
    async fn list_reports(
        &self,
        params: Parameters<ListReportsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let reports = self.do_list_reports(params.0.limit)?;
        json_result(&reports)
    }

    #[tool(description = "Get one generated report including its Markdown content.")]
    async fn get_report(
        &self,
        params: Parameters<GetReportRequest>,
    ) -> Result<CallToolResult, McpError> {
        let report = self.do_get_report(&params.0.report_id)?;
        json_result(&report)
    }

    #[tool(
        description = "Semantic search over past reports and uploaded reference documents. Returns ranked hits with a 200-character snippet. Returns an empty list when no embedding model is configured."
    )]
    async fn search_reports(
        &self,
        params: Parameters<SearchReportsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let hits = self
            .do_search_reports(&req.query, req.k, req.scope.as_deref())
            .await?;
        json_result(&hits)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "drafter".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"Drafter helps a user describe and draft a report.

CONVERSATION:
Call assistant_turn with a stable session_id for every user message. The first
call opens the conversation. Relay the reply to the user verbatim and pass their
answer back. Step 6 means the context is complete. A message that is only a
language name ("english", "español") switches the conversation language.

OUTLINES:
run_outline_command and render_outline act on outlines created over HTTP.

HISTORY:
list_reports, get_report and search_reports read the stored report history."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(state: AppState) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(state);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
