use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::application::{HistoryView, TurnRequest, TurnResult};
use crate::domain::{ConversationMode, DomainError};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
    pub mode: Option<String>,
    pub module: Option<String>,
}

impl From<ChatRequest> for TurnRequest {
    fn from(request: ChatRequest) -> Self {
        let mut turn = TurnRequest::new(request.message);
        turn.session_id = request.session_id;
        turn.module = request.module;
        if let Some(mode) = request.mode {
            turn.mode = mode;
        }
        turn
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: String,
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ModeDescriptor {
    pub id: ConversationMode,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_module: bool,
}

#[derive(Debug, Serialize)]
pub struct ModesResponse {
    pub modes: Vec<ModeDescriptor>,
    pub modules: Vec<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
}

/// Internal detail stays in the logs; clients get a generic message.
fn turn_error(e: DomainError) -> ApiError {
    match e {
        DomainError::Validation(msg) => error(StatusCode::BAD_REQUEST, msg),
        DomainError::VectorStoreUnavailable(detail) => {
            tracing::error!(error = %detail, "Vector store unavailable");
            error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Documentation index is unavailable",
            )
        }
        other => {
            tracing::error!(error = %other, "Failed to process chat turn");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process message")
        }
    }
}

fn session_not_found() -> ApiError {
    error(StatusCode::NOT_FOUND, "Session not found")
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<TurnResult>, ApiError> {
    state
        .orchestrator
        .process_turn(request.into())
        .await
        .map(Json)
        .map_err(turn_error)
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryView>, ApiError> {
    match state.orchestrator.history(&session_id).await {
        Ok(Some(view)) => Ok(Json(view)),
        Ok(None) => Err(session_not_found()),
        Err(e) => {
            tracing::error!(error = %e, %session_id, "Failed to retrieve history");
            Err(error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to retrieve history",
            ))
        }
    }
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    match state.orchestrator.delete_session(&session_id).await {
        Ok(true) => Ok(Json(DeleteResponse {
            status: "success".to_string(),
            message: format!("Session {session_id} deleted"),
            session_id,
        })),
        Ok(false) => Err(session_not_found()),
        Err(e) => {
            tracing::error!(error = %e, %session_id, "Failed to delete session");
            Err(error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete session",
            ))
        }
    }
}

pub async fn list_modes(State(state): State<AppState>) -> Json<ModesResponse> {
    let modes = ConversationMode::ALL
        .into_iter()
        .map(|mode| ModeDescriptor {
            id: mode,
            name: mode.display_name(),
            description: mode.description(),
            requires_module: mode == ConversationMode::ModuleDeepDive,
        })
        .collect();

    Json(ModesResponse {
        modes,
        modules: state
            .orchestrator
            .client()
            .module_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}
