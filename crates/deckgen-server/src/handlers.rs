use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use tracing::{error, info};

use deckgen_core::ids::PresentationId;
use deckgen_core::requests::{
    BatchTableGenerationRequest, BatchTextGenerationRequest, TableGenerationRequest,
    TextGenerationRequest,
};
use deckgen_core::responses::{
    BatchResponse, GeneratedTable, GeneratedText, HealthResponse, SessionDeleteResponse,
    SessionInfoResponse,
};

use crate::error::ApiError;
use crate::server::AppState;

const SERVICE_NAME: &str = "deckgen";

pub async fn generate_text(
    State(state): State<AppState>,
    Json(request): Json<TextGenerationRequest>,
) -> Result<Json<GeneratedText>, ApiError> {
    info!(slide_id = %request.slide_id, "text generation request");

    let cancel = state.shutdown.child_token();
    let result = state
        .generator
        .generate_text(&request, &cancel)
        .await
        .map_err(|e| {
            error!(slide_id = %request.slide_id, error = %e, "text generation failed");
            ApiError::internal(format!("Text generation failed: {e}"))
        })?;

    Ok(Json(result))
}

pub async fn generate_batch_text(
    State(state): State<AppState>,
    Json(batch): Json<BatchTextGenerationRequest>,
) -> Json<BatchResponse<GeneratedText>> {
    info!(
        total = batch.requests.len(),
        parallel = batch.parallel,
        "batch text generation request"
    );

    let cancel = state.shutdown.child_token();
    let outcome = state
        .generator
        .run_text_batch(&batch.requests, batch.parallel, &cancel)
        .await;
    Json(outcome)
}

pub async fn generate_table(
    State(state): State<AppState>,
    Json(request): Json<TableGenerationRequest>,
) -> Result<Json<GeneratedTable>, ApiError> {
    info!(slide_id = %request.slide_id, "table generation request");

    let cancel = state.shutdown.child_token();
    let result = state
        .generator
        .generate_table(&request, &cancel)
        .await
        .map_err(|e| {
            error!(slide_id = %request.slide_id, error = %e, "table generation failed");
            ApiError::internal(format!("Table generation failed: {e}"))
        })?;

    Ok(Json(result))
}

pub async fn generate_batch_table(
    State(state): State<AppState>,
    Json(batch): Json<BatchTableGenerationRequest>,
) -> Json<BatchResponse<GeneratedTable>> {
    info!(
        total = batch.requests.len(),
        parallel = batch.parallel,
        "batch table generation request"
    );

    let cancel = state.shutdown.child_token();
    let outcome = state
        .generator
        .run_table_batch(&batch.requests, batch.parallel, &cancel)
        .await;
    Json(outcome)
}

pub async fn session_info(
    State(state): State<AppState>,
    Path(presentation_id): Path<String>,
) -> Result<Json<SessionInfoResponse>, ApiError> {
    let id = PresentationId::new(presentation_id);

    let session = state
        .generator
        .sessions()
        .get_session_context(&id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get session info: {e}")))?
        .ok_or_else(|| ApiError::not_found(format!("Session not found: {id}")))?;

    let context_size_bytes = serde_json::to_string(&session)
        .map(|json| json.len())
        .unwrap_or(0);

    Ok(Json(SessionInfoResponse {
        presentation_id: session.presentation_id.clone(),
        slides_in_context: session.slide_history.len(),
        context_size_bytes,
        last_updated: session.last_updated.to_rfc3339(),
        ttl_remaining_seconds: session.ttl_remaining(Utc::now()),
    }))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(presentation_id): Path<String>,
) -> Result<Json<SessionDeleteResponse>, ApiError> {
    let id = PresentationId::new(presentation_id);
    let sessions = state.generator.sessions();

    let session = sessions
        .get_session_context(&id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete session: {e}")))?
        .ok_or_else(|| ApiError::not_found(format!("Session not found: {id}")))?;

    sessions
        .delete_session(&id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete session: {e}")))?;

    Ok(Json(SessionDeleteResponse {
        status: "success".to_string(),
        message: format!("Session deleted: {id}"),
        slides_removed: session.slide_history.len(),
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm = state.generator.llm();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: SERVICE_NAME.to_string(),
        llm_provider: llm.provider().to_string(),
        llm_model: llm.model().to_string(),
    })
}

pub async fn service_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "deckgen",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "description": "LLM-powered content generation for presentations",
        "endpoints": {
            "health": "/health",
            "text": "/api/v1/generate/text",
            "table": "/api/v1/generate/table",
            "batch_text": "/api/v1/generate/batch/text",
            "batch_table": "/api/v1/generate/batch/table",
            "session": "/api/v1/session/{presentation_id}",
        },
    }))
}
