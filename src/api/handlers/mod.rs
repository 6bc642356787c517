mod outlines;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::assistant::validator::{self, ValidationRequest, ValidationResult};
use crate::document::render;
use crate::export::{ExportError, ExportFormat, ExportedFile};
use crate::generator::GeneratorError;
use crate::models::*;
use crate::reports::ReportError;
use crate::retrieval::RetrievalError;
use crate::state::AppState;

pub use outlines::*;

type ApiError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side; clients only see a generic message.
///
/// Messages that describe a bad reference ("not found") are safe to expose and
/// are returned as-is with BAD_REQUEST.
fn internal_error(e: impl std::fmt::Display) -> ApiError {
    let msg = e.to_string();

    if msg.contains("not found") {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    let msg = msg.into();
    tracing::warn!("Validation error: {}", msg);
    (StatusCode::BAD_REQUEST, msg)
}

fn generator_error(e: GeneratorError) -> ApiError {
    tracing::warn!("Generator failure: {}", e);
    (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
}

fn report_error(e: ReportError) -> ApiError {
    match e {
        ReportError::MissingTopic => bad_request(e.to_string()),
        ReportError::Generator(e) => generator_error(e),
        ReportError::Storage(e) => internal_error(e),
    }
}

fn export_error(e: ExportError) -> ApiError {
    match e {
        ExportError::UnsupportedFormat(_) | ExportError::EmptyContent => bad_request(e.to_string()),
        ExportError::Converter(msg) => {
            tracing::error!("Converter failure: {}", msg);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Document conversion failed".to_string(),
            )
        }
        ExportError::Io(e) => internal_error(e),
    }
}

fn retrieval_error(e: RetrievalError) -> ApiError {
    match e {
        RetrievalError::Unavailable | RetrievalError::Embedding(_) => {
            tracing::warn!("Embedding failure: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        RetrievalError::Storage(e) => internal_error(e),
    }
}

fn attachment(file: ExportedFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.format.media_type().to_string()),
            (header::CONTENT_DISPOSITION, file.content_disposition()),
        ],
        file.bytes,
    )
        .into_response()
}

async fn export_markdown(
    state: &AppState,
    markdown: &str,
    format: &str,
) -> Result<Response, ApiError> {
    let format = ExportFormat::parse(format).map_err(export_error)?;
    let file = state
        .exporter
        .export(markdown, format)
        .await
        .map_err(export_error)?;
    Ok(attachment(file))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Assistant
// ============================================================

pub async fn assistant_turn(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(input): Json<TurnInput>,
) -> Json<TurnReply> {
    Json(state.assistant.handle_turn(&session_id, &input.message).await)
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ConversationState>, ApiError> {
    state
        .assistant
        .conversation(&session_id)
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Conversation not found".to_string()))
}

pub async fn reset_conversation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.assistant.reset(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Conversation not found".to_string()))
    }
}

/// Generate the report a finished conversation describes.
pub async fn generate_conversation_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<(StatusCode, Json<GenerateReportResponse>), ApiError> {
    let conversation = state
        .assistant
        .conversation(&session_id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Conversation not found".to_string()))?;
    if !conversation.is_finished() {
        return Err(bad_request("Conversation is not finished"));
    }
    let input = conversation
        .report_input()
        .ok_or_else(|| bad_request("Conversation has no topic"))?;

    let report = state
        .reports
        .generate(input, state.default_language)
        .await
        .map_err(report_error)?;
    Ok((
        StatusCode::CREATED,
        Json(GenerateReportResponse {
            id: report.id,
            content: report.content,
        }),
    ))
}

pub async fn validate_input(
    State(state): State<AppState>,
    Json(request): Json<ValidationRequest>,
) -> Json<ValidationResult> {
    let result = validator::validate_request(&request, state.default_language);
    if !result.valid {
        tracing::debug!(step = %result.step, "Input rejected by validator");
    }
    Json(result)
}

// ============================================================
// Reports
// ============================================================

pub async fn generate_report(
    State(state): State<AppState>,
    Json(input): Json<GenerateReportInput>,
) -> Result<(StatusCode, Json<GenerateReportResponse>), ApiError> {
    let report = state
        .reports
        .generate(input, state.default_language)
        .await
        .map_err(report_error)?;
    Ok((
        StatusCode::CREATED,
        Json(GenerateReportResponse {
            id: report.id,
            content: report.content,
        }),
    ))
}

pub async fn list_reports(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportSummary>>, ApiError> {
    state
        .db
        .get_all_reports()
        .map(|reports| Json(reports.into_iter().map(ReportSummary::from).collect()))
        .map_err(internal_error)
}

/// A stored report as JSON, or converted when `?export=docx|pdf` is given.
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let report = state
        .db
        .get_report(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Report not found".to_string()))?;

    match query.export {
        Some(format) => export_markdown(&state, &report.content, &format).await,
        None => Ok(Json(report).into_response()),
    }
}

pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_report(id).map_err(internal_error)? {
        tracing::info!(report_id = %id, "Report deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Report not found".to_string()))
    }
}

/// Import a stored report's Markdown into a new outline.
pub async fn create_outline_from_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Outline>), ApiError> {
    let report = state
        .db
        .get_report(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Report not found".to_string()))?;

    let document = render::from_markdown(&report.content);
    state
        .db
        .create_outline(report.topic, Some(report.id), document)
        .map(|o| (StatusCode::CREATED, Json(o)))
        .map_err(internal_error)
}

// ============================================================
// Search and reference documents
// ============================================================

pub async fn search(
    State(state): State<AppState>,
    Json(query): Json<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    if query.query.trim().is_empty() {
        return Err(bad_request("Search query is empty"));
    }
    state
        .retriever
        .search(&query)
        .await
        .map(Json)
        .map_err(retrieval_error)
}

pub async fn upload_reference(
    State(state): State<AppState>,
    Json(input): Json<CreateReferenceInput>,
) -> Result<(StatusCode, Json<ReferenceUploadResponse>), ApiError> {
    if input.name.trim().is_empty() {
        return Err(bad_request("Reference name is empty"));
    }
    if input.content.trim().is_empty() {
        return Err(bad_request("Reference content is empty"));
    }

    let document = state.db.create_reference(input).map_err(internal_error)?;
    let indexed_chunks = if state.retriever.is_available() {
        match state.retriever.index_reference(&document).await {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::warn!(
                    reference_id = %document.id,
                    error = %e,
                    "Failed to index reference"
                );
                0
            }
        }
    } else {
        0
    };

    Ok((
        StatusCode::CREATED,
        Json(ReferenceUploadResponse {
            document,
            indexed_chunks,
        }),
    ))
}

pub async fn list_references(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReferenceDocument>>, ApiError> {
    state
        .db
        .get_all_references()
        .map(Json)
        .map_err(internal_error)
}

pub async fn delete_reference(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_reference(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Reference not found".to_string()))
    }
}

// ============================================================
// Exports
// ============================================================

pub async fn export_document(
    State(state): State<AppState>,
    Json(input): Json<ExportInput>,
) -> Result<Response, ApiError> {
    export_markdown(&state, &input.content, &input.format).await
}
