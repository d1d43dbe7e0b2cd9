pub mod config;
pub mod gateway;
pub mod metrics_server;
pub mod observability;
pub mod rpc;
pub mod service;

pub use service::{PageResult, QueryError, ReadingQueryService};
