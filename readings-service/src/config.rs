use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub csv_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub bind_addr: String,
    /// Base URL of the RPC server, e.g. "http://127.0.0.1:9090".
    pub rpc_target: String,
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
    /// How long to wait for the RPC server to become healthy at startup.
    #[serde(default = "default_rpc_wait_timeout_ms")]
    pub rpc_wait_timeout_ms: u64,
}

fn default_upstream_timeout_ms() -> u64 {
    5_000
}

fn default_rpc_wait_timeout_ms() -> u64 {
    20_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub rpc: RpcServerConfig,
    pub gateway: GatewayConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("READINGS_CONFIG").unwrap_or_else(|_| "readings-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}
