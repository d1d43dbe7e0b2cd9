use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, OffsetDateTime, UtcOffset,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListReadingsRequest {
    /// Inclusive lower bound, RFC 3339 text.
    pub start: Option<String>,
    /// Exclusive upper bound, RFC 3339 text.
    pub end: Option<String>,
    pub page_size: i32,
    pub page_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReading {
    pub time: String,
    pub usage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReadingsResponse {
    pub readings: Vec<WireReading>,
    #[serde(default)]
    pub next_page_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcCode {
    Ok,
    InvalidArgument,
    DeadlineExceeded,
    Internal,
    /// Forward compatibility: codes this build does not know about.
    #[serde(other)]
    Unknown,
}

impl RpcCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::InvalidArgument => "invalid_argument",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Internal => "internal",
            Self::Unknown => "unknown",
        }
    }
}

/// Error body on the RPC surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: String,
}

pub fn parse_timestamp(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(s, &Rfc3339)
}

/// Formats as RFC 3339 normalized to UTC.
pub fn format_timestamp(ts: OffsetDateTime) -> Result<String, time::error::Format> {
    ts.to_offset(UtcOffset::UTC).format(&Rfc3339)
}
