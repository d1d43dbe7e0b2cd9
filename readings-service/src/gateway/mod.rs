//! HTTP gateway in front of the RPC service.
//!
//! Parses and validates the query surface before any downstream call, then
//! translates the RPC outcome into HTTP with its own mapping table: the RPC
//! and HTTP status spaces are related but not isomorphic.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::observability::TelemetrySink;
use crate::rpc::client::{ReadingsRpc, RpcError};
use crate::rpc::wire::{self, ListReadingsRequest, RpcCode};

#[derive(Clone)]
pub struct GatewayState {
    pub rpc: Arc<dyn ReadingsRpc>,
    pub telemetry: Arc<dyn TelemetrySink>,
    /// Bound on each outbound RPC call. A hung upstream must not stall the
    /// inbound request past this.
    pub upstream_timeout: Duration,
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/readings", get(list_readings))
        .route("/healthz", get(healthz))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_request,
        ))
        .with_state(state)
}

/// Correlation id attached to every response and error body.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingJson {
    pub time: String,
    pub usage: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReadingsJson {
    pub readings: Vec<ReadingJson>,
    #[serde(default)]
    pub next_page_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorJson {
    pub code: String,
    pub message: String,
    pub request_id: String,
}

async fn track_request(State(state): State<GatewayState>, mut req: Request, next: Next) -> Response {
    let started = Instant::now();
    let route = route_label(req.uri().path());
    let method = req.method().clone();

    let request_id = RequestId::generate();
    req.extensions_mut().insert(request_id.clone());

    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.0) {
        resp.headers_mut().insert("x-request-id", value);
    }

    let elapsed = started.elapsed();
    state
        .telemetry
        .http_request(route, method.as_str(), resp.status().as_u16(), elapsed);

    // Keep health checks quiet.
    if route != "healthz" {
        tracing::info!(
            method = %method,
            route,
            status = resp.status().as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            request_id = %request_id.0,
            "http request",
        );
    }

    resp
}

fn route_label(path: &str) -> &'static str {
    match path {
        "/api/readings" => "api_readings",
        "/healthz" => "healthz",
        _ => "other",
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    start: Option<String>,
    end: Option<String>,
    page_size: Option<String>,
    page_token: Option<String>,
}

async fn list_readings(
    State(state): State<GatewayState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<ListParams>,
) -> Response {
    // Surface validation first: every rejection here saves a downstream
    // call. The RPC endpoint re-validates everything independently.
    let start = match parse_optional_timestamp(params.start.as_deref()) {
        Ok(v) => v,
        Err(_) => return api_error(StatusCode::BAD_REQUEST, "invalid_argument", "invalid start", &request_id),
    };
    let end = match parse_optional_timestamp(params.end.as_deref()) {
        Ok(v) => v,
        Err(_) => return api_error(StatusCode::BAD_REQUEST, "invalid_argument", "invalid end", &request_id),
    };
    if let (Some(s), Some(e)) = (start, end) {
        if s >= e {
            return api_error(
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                "invalid range: start must be before end",
                &request_id,
            );
        }
    }

    let page_size = match params.page_size.as_deref().unwrap_or("") {
        "" => 0,
        raw => match raw.parse::<i32>() {
            Ok(n) => n,
            Err(_) => {
                return api_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_argument",
                    "invalid page_size",
                    &request_id,
                )
            }
        },
    };
    if page_size < 0 {
        return api_error(
            StatusCode::BAD_REQUEST,
            "invalid_argument",
            "page_size must be >= 0",
            &request_id,
        );
    }
    let page_token = params.page_token.unwrap_or_default();
    if !page_token.is_empty() && page_size == 0 {
        return api_error(
            StatusCode::BAD_REQUEST,
            "invalid_argument",
            "page_token requires page_size",
            &request_id,
        );
    }

    // The raw timestamp text travels as-is; the endpoint parses it again.
    let rpc_req = ListReadingsRequest {
        start: params.start.filter(|s| !s.is_empty()),
        end: params.end.filter(|s| !s.is_empty()),
        page_size,
        page_token,
    };

    let call_started = Instant::now();
    let outcome = tokio::time::timeout(state.upstream_timeout, state.rpc.list_readings(rpc_req)).await;
    let call_elapsed = call_started.elapsed();

    let resp = match outcome {
        Err(_) => {
            state.telemetry.upstream_call("deadline_exceeded", call_elapsed);
            return api_error(
                StatusCode::GATEWAY_TIMEOUT,
                "upstream_timeout",
                "upstream timeout",
                &request_id,
            );
        }
        Ok(Err(RpcError::Timeout)) => {
            state.telemetry.upstream_call("deadline_exceeded", call_elapsed);
            return api_error(
                StatusCode::GATEWAY_TIMEOUT,
                "upstream_timeout",
                "upstream timeout",
                &request_id,
            );
        }
        Ok(Err(RpcError::Status { code, message })) => {
            state.telemetry.upstream_call(code.as_str(), call_elapsed);
            return match code {
                RpcCode::InvalidArgument => {
                    api_error(StatusCode::BAD_REQUEST, "invalid_argument", &message, &request_id)
                }
                RpcCode::DeadlineExceeded => api_error(
                    StatusCode::GATEWAY_TIMEOUT,
                    "upstream_timeout",
                    "upstream timeout",
                    &request_id,
                ),
                // Opaque on purpose; internal detail stays on the RPC side.
                _ => api_error(
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "upstream error",
                    &request_id,
                ),
            };
        }
        Ok(Err(RpcError::Transport(e))) => {
            state.telemetry.upstream_call("transport_error", call_elapsed);
            tracing::warn!(error = %e, request_id = %request_id.0, "upstream transport error");
            return api_error(
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "upstream error",
                &request_id,
            );
        }
        Ok(Ok(resp)) => {
            state.telemetry.upstream_call("ok", call_elapsed);
            resp
        }
    };

    let mut readings = Vec::with_capacity(resp.readings.len());
    for r in &resp.readings {
        let ts = match wire::parse_timestamp(&r.time) {
            Ok(t) => t,
            Err(_) => {
                return api_error(
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "upstream returned invalid timestamp",
                    &request_id,
                )
            }
        };
        let time = match wire::format_timestamp(ts) {
            Ok(t) => t,
            Err(_) => {
                return api_error(
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "upstream returned invalid timestamp",
                    &request_id,
                )
            }
        };
        readings.push(ReadingJson {
            time,
            usage: r.usage,
        });
    }

    (
        StatusCode::OK,
        Json(ListReadingsJson {
            readings,
            next_page_token: resp.next_page_token,
        }),
    )
        .into_response()
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn not_found(Extension(request_id): Extension<RequestId>) -> Response {
    api_error(StatusCode::NOT_FOUND, "not_found", "not found", &request_id)
}

fn parse_optional_timestamp(
    v: Option<&str>,
) -> Result<Option<OffsetDateTime>, time::error::Parse> {
    match v {
        None | Some("") => Ok(None),
        Some(s) => wire::parse_timestamp(s).map(Some),
    }
}

fn api_error(status: StatusCode, code: &str, message: &str, request_id: &RequestId) -> Response {
    (
        status,
        Json(ApiErrorJson {
            code: code.to_string(),
            message: message.to_string(),
            request_id: request_id.0.clone(),
        }),
    )
        .into_response()
}
