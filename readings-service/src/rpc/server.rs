use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::rpc::wire::{ListReadingsRequest, RpcCode};
use crate::rpc::handle_list_readings;
use crate::service::ReadingQueryService;

#[derive(Clone)]
struct RpcState {
    svc: Arc<ReadingQueryService>,
}

/// RPC surface: one operation plus a readiness probe.
pub fn router(svc: Arc<ReadingQueryService>) -> Router {
    Router::new()
        .route("/rpc/v1/list_readings", post(list_readings))
        .route("/healthz", get(healthz))
        .with_state(RpcState { svc })
}

async fn list_readings(
    State(state): State<RpcState>,
    Json(req): Json<ListReadingsRequest>,
) -> Response {
    match handle_list_readings(&state.svc, &req) {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(status) => {
            let http = match status.code {
                RpcCode::InvalidArgument => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (http, Json(status)).into_response()
        }
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::wire::{ListReadingsResponse, RpcStatus};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use meter_store::{Reading, ReadingStore};
    use time::macros::datetime;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = Arc::new(ReadingStore::new(vec![
            Reading {
                ts: datetime!(2019-01-01 00:15:00 UTC),
                usage: 1.1,
            },
            Reading {
                ts: datetime!(2019-01-01 00:30:00 UTC),
                usage: 2.2,
            },
        ]));
        router(Arc::new(ReadingQueryService::new(store)))
    }

    fn rpc_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/rpc/v1/list_readings")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn list_readings_returns_page_json() {
        let resp = app().oneshot(rpc_request(r#"{"pageSize":1}"#)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let decoded: ListReadingsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded.readings.len(), 1);
        assert_eq!(decoded.readings[0].time, "2019-01-01T00:15:00Z");
        assert!(!decoded.next_page_token.is_empty());
    }

    #[tokio::test]
    async fn invalid_argument_maps_to_400_with_status_body() {
        let resp = app()
            .oneshot(rpc_request(r#"{"start":"garbage"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let status: RpcStatus = serde_json::from_slice(&body).unwrap();
        assert_eq!(status.code, RpcCode::InvalidArgument);
    }

    #[tokio::test]
    async fn page_token_without_page_size_maps_to_400() {
        let resp = app()
            .oneshot(rpc_request(r#"{"pageToken":"123"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
