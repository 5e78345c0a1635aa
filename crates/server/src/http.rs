//! HTTP Endpoints
//!
//! REST API for the sales assistant:
//! - `POST /api/chatbot` (alias `/chat`): one chat turn
//! - `/api/sales`: direct CRUD over sales records
//! - `/api/conversations`: inspect or reset pending dialogues
//! - `/health`, `/ready`, `/metrics`

use std::time::{Duration, Instant};

use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use buffet_pos_core::{DateRange, Sale, SaleDraft, SaleId, SalePatch};

use crate::metrics::{metrics_handler, record_chat_latency, record_error, record_request};
use crate::state::AppState;
use crate::ServerError;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );

    Router::new()
        // Chat
        .route("/api/chatbot", post(chat))
        .route("/chat", post(chat))
        // Sales records
        .route("/api/sales", get(list_sales).post(create_sale))
        .route("/api/sales/:id", put(update_sale).delete(delete_sale))
        // Dialogue sessions
        .route("/api/conversations", get(list_conversations))
        .route(
            "/api/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    // Wildcard is rejected in production by settings validation
    if origins.iter().any(|o| o == "*") {
        tracing::info!("CORS configured for any origin");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        }
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(DEFAULT_CORS_ORIGIN))
            .allow_methods(methods)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(methods)
        .allow_headers(Any)
}

/// Chat request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default, alias = "userId")]
    conversation_id: Option<String>,
}

/// Chat endpoint
///
/// Turn failures never surface as transport errors: the body always carries
/// a Thai `reply`.
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    record_request("chat");
    let templates = state.assistant.templates();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected chat payload");
            return reply_with(StatusCode::BAD_REQUEST, &templates.empty_message);
        }
    };

    if request.message.trim().is_empty() {
        return reply_with(StatusCode::BAD_REQUEST, &templates.empty_message);
    }

    let start = Instant::now();
    let result = state
        .assistant
        .handle(request.conversation_id.as_deref(), &request.message)
        .await;
    record_chat_latency(start.elapsed().as_secs_f64());

    match result {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => {
            record_error(e.kind());
            tracing::error!(
                error = %e,
                kind = e.kind(),
                conversation_id = ?request.conversation_id,
                "Chat turn failed"
            );
            reply_with(StatusCode::INTERNAL_SERVER_ERROR, &templates.system_error)
        }
    }
}

fn reply_with(status: StatusCode, reply: &str) -> Response {
    (status, Json(serde_json::json!({ "reply": reply }))).into_response()
}

/// Sales list filter; both dates are needed to filter
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalesFilter {
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn list_sales(
    State(state): State<AppState>,
    Query(filter): Query<SalesFilter>,
) -> Result<Json<Vec<Sale>>, ServerError> {
    record_request("sales");
    let range = match (filter.start_date.as_deref(), filter.end_date.as_deref()) {
        (Some(start), Some(end)) => Some(DateRange::parse(start, end).ok_or_else(|| {
            ServerError::InvalidRequest(format!(
                "startDate and endDate must be YYYY-MM-DD, got {} .. {}",
                start, end
            ))
        })?),
        _ => None,
    };
    Ok(Json(state.sales.list(range).await?))
}

/// Create a sale; `totalAmount` defaults to customers × price
async fn create_sale(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Sale>), ServerError> {
    record_request("sales");
    let explicit_total = body.get("totalAmount").and_then(Value::as_u64);
    let draft: SaleDraft =
        serde_json::from_value(body).map_err(|e| ServerError::InvalidRequest(e.to_string()))?;

    let missing = draft.missing_fields();
    if !missing.is_empty() {
        let names = missing
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ServerError::InvalidRequest(format!(
            "missing fields: {}",
            names
        )));
    }

    let mut sale = draft
        .to_new_sale()
        .ok_or_else(|| ServerError::InvalidRequest("incomplete sale".to_string()))?;
    if let Some(total) = explicit_total {
        sale.total_amount = total;
    }

    let created = state.sales.create(sale).await?;
    tracing::info!(sale_id = created.id, total = created.total_amount, "Sale created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<SaleId>,
    Json(patch): Json<SalePatch>,
) -> Result<Json<Sale>, ServerError> {
    record_request("sales");
    state.sales.update(id, patch).await?;
    let updated = state
        .sales
        .get(id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("sale {}", id)))?;
    tracing::info!(sale_id = id, "Sale updated");
    Ok(Json(updated))
}

async fn delete_sale(
    State(state): State<AppState>,
    Path(id): Path<SaleId>,
) -> Result<StatusCode, ServerError> {
    record_request("sales");
    state.sales.delete(id).await?;
    tracing::info!(sale_id = id, "Sale deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// List conversations with a pending dialogue
async fn list_conversations(State(state): State<AppState>) -> Result<Json<Value>, ServerError> {
    record_request("conversations");
    let ids = state.sessions().list_ids().await?;
    Ok(Json(serde_json::json!({
        "count": ids.len(),
        "conversations": ids,
    })))
}

/// Current dialogue state of one conversation
async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    record_request("conversations");
    let dialogue = state
        .sessions()
        .get(&id)
        .await?
        .filter(|s| !s.is_idle())
        .ok_or_else(|| ServerError::NotFound(format!("conversation {}", id)))?;

    let snapshot = serde_json::to_value(dialogue.snapshot())
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(Json(serde_json::json!({
        "conversationId": id,
        "state": snapshot,
    })))
}

/// Reset a conversation
async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    record_request("conversations");
    state.assistant.reset(&id).await?;
    tracing::info!(conversation_id = %id, "Conversation reset");
    Ok(StatusCode::NO_CONTENT)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    record_request("health");
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "sales_store": {
                "status": "ok",
                "name": state.sales.name(),
            },
            "conversations": {
                "status": "ok",
                "count": state.sessions().len(),
            },
        }
    }))
}

/// Readiness: the oracle backend must be reachable
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let llm_status =
        match tokio::time::timeout(Duration::from_secs(2), state.llm.is_available()).await {
            Ok(true) => "ok",
            Ok(false) => "unavailable",
            Err(_) => "timeout",
        };
    let ready = llm_status == "ok";

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": {
                "llm_backend": {
                    "status": llm_status,
                    "model": state.llm.model_name(),
                }
            }
        })),
    )
}
