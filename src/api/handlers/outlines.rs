use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use super::{bad_request, export_markdown, internal_error, ApiError};
use crate::document::{command::CommandInterpreter, render, Document, NodeKind};
use crate::models::*;
use crate::state::AppState;

fn outline_not_found() -> ApiError {
    (StatusCode::NOT_FOUND, "Outline not found".to_string())
}

fn load(state: &AppState, id: Uuid) -> Result<Outline, ApiError> {
    state
        .db
        .get_outline(id)
        .map_err(internal_error)?
        .ok_or_else(outline_not_found)
}

pub async fn create_outline(
    State(state): State<AppState>,
    Json(input): Json<CreateOutlineInput>,
) -> Result<(StatusCode, Json<Outline>), ApiError> {
    if input.title.trim().is_empty() {
        return Err(bad_request("Outline title is empty"));
    }
    let document = input
        .markdown
        .as_deref()
        .map(render::from_markdown)
        .unwrap_or_default();

    state
        .db
        .create_outline(input.title, None, document)
        .map(|o| (StatusCode::CREATED, Json(o)))
        .map_err(internal_error)
}

pub async fn list_outlines(
    State(state): State<AppState>,
) -> Result<Json<Vec<OutlineSummary>>, ApiError> {
    state
        .db
        .get_all_outlines()
        .map(|outlines| Json(outlines.into_iter().map(OutlineSummary::from).collect()))
        .map_err(internal_error)
}

pub async fn get_outline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Outline>, ApiError> {
    load(&state, id).map(Json)
}

pub async fn delete_outline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_outline(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(outline_not_found())
    }
}

pub async fn add_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AddSectionInput>,
) -> Result<(StatusCode, Json<AddSectionResponse>), ApiError> {
    if input.kind == NodeKind::Root {
        return Err(bad_request("A document has exactly one root"));
    }

    let added = state
        .db
        .with_outline_mut(id, |doc| doc.add_section(input.kind, input.text, input.parent_id))
        .map_err(internal_error)?
        .ok_or_else(outline_not_found)?;

    added
        .map(|id| (StatusCode::CREATED, Json(AddSectionResponse { id })))
        .map_err(|e| bad_request(e.to_string()))
}

/// Apply a soft-miss node operation; `false` from the document means 404.
fn edit_node(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut Document) -> bool,
) -> Result<StatusCode, ApiError> {
    let applied = state
        .db
        .with_outline_mut(id, f)
        .map_err(internal_error)?
        .ok_or_else(outline_not_found)?;

    if applied {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Section not found".to_string()))
    }
}

pub async fn update_node_text(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateTextInput>,
) -> Result<StatusCode, ApiError> {
    edit_node(&state, id, |doc| doc.update_text(node_id, input.text))
}

pub async fn delete_node(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    edit_node(&state, id, |doc| doc.delete_section(node_id))
}

pub async fn outline_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OutlineStats>, ApiError> {
    load(&state, id).map(|outline| Json(OutlineStats::of(&outline.document)))
}

pub async fn outline_tree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<String, ApiError> {
    load(&state, id).map(|outline| render::render_outline(&outline.document, &outline.title))
}

/// Interpret a one-line command. Load, interpretation and save happen under a
/// single database lock.
pub async fn run_command(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<OutlineCommandInput>,
) -> Result<Json<OutlineCommandResponse>, ApiError> {
    let interpreter = CommandInterpreter::new(state.default_language);
    let reply = state
        .db
        .with_outline_mut(id, |doc| interpreter.interpret(doc, &input.command))
        .map_err(internal_error)?
        .ok_or_else(outline_not_found)?;

    tracing::debug!(outline_id = %id, command = %input.command, reply = %reply, "Outline command");
    Ok(Json(OutlineCommandResponse { reply }))
}

/// The outline as Markdown, or converted when `?format=docx|pdf` is given.
pub async fn export_outline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let outline = load(&state, id)?;
    let markdown = render::render_markdown(&outline.document);

    match query.export.as_deref() {
        None | Some("markdown") | Some("md") => Ok((
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            markdown,
        )
            .into_response()),
        Some(format) => export_markdown(&state, &markdown, format).await,
    }
}
