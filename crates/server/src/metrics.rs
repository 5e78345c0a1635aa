//! Observability Metrics
//!
//! Prometheus metrics endpoint for monitoring.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::state::AppState;
use crate::ServerError;

/// Global Prometheus handle
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder
///
/// Must be called once at startup before recording any metrics.
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Internal(format!("Failed to install Prometheus recorder: {}", e)))?;

    register_default_metrics();

    METRICS_HANDLE.get_or_init(|| handle.clone());
    Ok(handle)
}

pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

fn register_default_metrics() {
    gauge!("buffet_pos_conversations_active").set(0.0);

    counter!("buffet_pos_requests_total", "endpoint" => "chat").absolute(0);
    counter!("buffet_pos_requests_total", "endpoint" => "sales").absolute(0);
    counter!("buffet_pos_requests_total", "endpoint" => "conversations").absolute(0);
    counter!("buffet_pos_requests_total", "endpoint" => "health").absolute(0);

    histogram!("buffet_pos_chat_turn_duration_seconds").record(0.0);

    counter!("buffet_pos_errors_total", "type" => "classifier_unavailable").absolute(0);
    counter!("buffet_pos_errors_total", "type" => "malformed_oracle_response").absolute(0);
    counter!("buffet_pos_errors_total", "type" => "downstream_store").absolute(0);
}

pub fn record_request(endpoint: &'static str) {
    counter!("buffet_pos_requests_total", "endpoint" => endpoint).increment(1);
}

/// Record one chat turn's wall time
pub fn record_chat_latency(duration_secs: f64) {
    histogram!("buffet_pos_chat_turn_duration_seconds").record(duration_secs);
}

pub fn record_active_conversations(count: usize) {
    gauge!("buffet_pos_conversations_active").set(count as f64);
}

pub fn record_error(error_type: &'static str) {
    counter!("buffet_pos_errors_total", "type" => error_type).increment(1);
}

/// Metrics endpoint handler
///
/// Returns Prometheus-formatted metrics.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    record_active_conversations(state.assistant.sessions().len());

    match get_metrics_handle() {
        Some(handle) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_helpers() {
        // No recorder installed; these must be no-ops
        record_request("chat");
        record_chat_latency(0.25);
        record_active_conversations(3);
        record_error("classifier_unavailable");
    }
}
