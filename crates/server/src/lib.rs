//! Buffet POS Server
//!
//! HTTP endpoints for the chat assistant, the sales records it manages and
//! conversation inspection.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{
    init_metrics, record_active_conversations, record_chat_latency, record_error, record_request,
};
pub use state::AppState;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use buffet_pos_agent::AgentError;
use buffet_pos_core::StoreError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Sales store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServerError::NotFound(format!("sale {}", id)),
            StoreError::InvalidData(msg) => ServerError::InvalidRequest(msg),
            StoreError::Backend(msg) => ServerError::Store(msg),
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Agent(AgentError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = StatusCode::from(self);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
