use std::sync::Arc;
use std::time::Duration;

use crate::rpc::handle_list_readings;
use crate::rpc::wire::{ListReadingsRequest, ListReadingsResponse, RpcCode, RpcStatus};
use crate::service::ReadingQueryService;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("rpc status {}: {message}", .code.as_str())]
    Status { code: RpcCode, message: String },
    #[error("rpc deadline exceeded")]
    Timeout,
    #[error("rpc transport error: {0}")]
    Transport(String),
}

/// The one capability the gateway needs from the RPC service.
///
/// Satisfied by [`HttpRpcClient`] in production, [`LocalRpcClient`] for
/// single-process wiring, and fakes in tests.
#[async_trait::async_trait]
pub trait ReadingsRpc: Send + Sync {
    async fn list_readings(&self, req: ListReadingsRequest)
        -> Result<ListReadingsResponse, RpcError>;
}

/// Network-backed client for the RPC server.
pub struct HttpRpcClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRpcClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            timeout,
        }
    }

    pub async fn check_health(&self) -> bool {
        let url = format!("{}/healthz", self.base_url);
        match self
            .http
            .get(&url)
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Waits for the RPC server to come up, polling `/healthz` with capped
    /// exponential backoff. Logs and returns on expiry rather than failing;
    /// the caller may still want to serve and surface upstream errors.
    pub async fn wait_ready(&self, max_wait: Duration) {
        if max_wait.is_zero() {
            return;
        }

        let deadline = tokio::time::Instant::now() + max_wait;
        let mut backoff = Duration::from_millis(100);
        loop {
            if self.check_health().await {
                tracing::info!("rpc server is ready");
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(waited = ?max_wait, "rpc server not ready; continuing anyway");
                return;
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(Duration::from_secs(1));
        }
    }
}

#[async_trait::async_trait]
impl ReadingsRpc for HttpRpcClient {
    async fn list_readings(
        &self,
        req: ListReadingsRequest,
    ) -> Result<ListReadingsResponse, RpcError> {
        let url = format!("{}/rpc/v1/list_readings", self.base_url);
        let resp = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout
                } else {
                    RpcError::Transport(e.to_string())
                }
            })?;

        if resp.status().is_success() {
            return resp
                .json::<ListReadingsResponse>()
                .await
                .map_err(|e| RpcError::Transport(format!("decode response: {e}")));
        }

        match resp.json::<RpcStatus>().await {
            Ok(st) if st.code == RpcCode::DeadlineExceeded => Err(RpcError::Timeout),
            Ok(st) => Err(RpcError::Status {
                code: st.code,
                message: st.message,
            }),
            Err(e) => Err(RpcError::Transport(format!("decode error body: {e}"))),
        }
    }
}

/// In-process client: same handler path as the server, no network.
pub struct LocalRpcClient {
    svc: Arc<ReadingQueryService>,
}

impl LocalRpcClient {
    pub fn new(svc: Arc<ReadingQueryService>) -> Self {
        Self { svc }
    }
}

#[async_trait::async_trait]
impl ReadingsRpc for LocalRpcClient {
    async fn list_readings(
        &self,
        req: ListReadingsRequest,
    ) -> Result<ListReadingsResponse, RpcError> {
        handle_list_readings(&self.svc, &req).map_err(|st| RpcError::Status {
            code: st.code,
            message: st.message,
        })
    }
}
