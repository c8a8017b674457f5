//! HTTP request handlers.

use crate::chain::ChainClient;
use crate::metrics::METRICS;
use crate::middleware::RequestId;
use crate::request::RelayRequest;
use crate::response::HealthResponse;
use crate::state::AppState;
use crate::Error;
use axum::extract::{FromRequest, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Liveness check.
pub async fn health<C: ChainClient>(State(state): State<Arc<AppState<C>>>) -> impl IntoResponse {
    let relayer = &state.relayer;
    Json(HealthResponse {
        status: "ok",
        relayer: relayer.chain().relayer_address().to_string(),
        relay_hub: relayer.settings().relay_hub.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
    })
}

/// Trust and balance snapshot for the configured default paymaster.
pub async fn status<C: ChainClient>(State(state): State<Arc<AppState<C>>>) -> Response {
    let paymaster = match state.config.paymaster() {
        Ok(Some(p)) => p,
        Ok(None) | Err(_) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": "No paymaster configured" })),
            )
                .into_response();
        }
    };

    Json(state.relayer.status(paymaster).await).into_response()
}

/// Prometheus metrics in text exposition format.
pub async fn metrics() -> impl IntoResponse {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        METRICS.render(),
    )
}

/// Validate, verify, simulate and dispatch one sponsored call.
pub async fn relay<C: ChainClient>(
    State(state): State<Arc<AppState<C>>>,
    request_parts: axum::extract::Request,
) -> Response {
    let start = std::time::Instant::now();
    METRICS.relay_total.fetch_add(1, Ordering::Relaxed);
    state.request_count.fetch_add(1, Ordering::Relaxed);

    // Extract correlation ID (set by middleware).
    let req_id = request_parts
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default();

    let result = match Json::<Value>::from_request(request_parts, &state).await {
        Ok(Json(body)) => match RelayRequest::from_json(&body) {
            Ok(request) => {
                info!(
                    req_id = %req_id,
                    paymaster = %request.paymaster,
                    target = %request.target,
                    user = %request.user,
                    gas_limit = request.gas_limit,
                    "Relaying request"
                );
                state.relayer.relay(&request, &req_id).await
            }
            Err(e) => Err(e),
        },
        Err(rejection) => {
            let status = rejection.status();
            warn!(req_id = %req_id, %status, error = %rejection, "Invalid JSON body");
            match status {
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(Error::InvalidRequest("Invalid JSON body".into()))
                }
                // Oversized body or wrong content type keep their own status.
                _ => {
                    let message = rejection.body_text();
                    METRICS.record_relay_duration(start);
                    METRICS.record_error(&Error::InvalidRequest(message.clone()));
                    return (status, Json(serde_json::json!({ "error": message })))
                        .into_response();
                }
            }
        }
    };

    METRICS.record_relay_duration(start);
    match result {
        Ok(receipt) => {
            METRICS.record_success(receipt.gas_used);
            (StatusCode::OK, Json(receipt)).into_response()
        }
        Err(e) => {
            METRICS.record_error(&e);
            match e.status_code() {
                StatusCode::BAD_REQUEST => warn!(req_id = %req_id, error = %e, "Rejected request"),
                _ => error!(req_id = %req_id, kind = e.kind(), error = %e, "Relay failed"),
            }
            e.into_response()
        }
    }
}
