//! Typed RPC contract for listing readings, carried as JSON over HTTP.
//!
//! One operation, `list_readings`. The server side lives in [`server`], the
//! client capability (real transport plus an in-process variant) in
//! [`client`], and the wire schema in [`wire`].

pub mod client;
pub mod server;
pub mod wire;

use crate::service::ReadingQueryService;
use wire::{ListReadingsRequest, ListReadingsResponse, RpcCode, RpcStatus, WireReading};

/// Executes one `list_readings` call against the Query Service.
///
/// Shared by the network server and the in-process client so both transports
/// validate and translate identically. Domain validation failures become
/// `invalid_argument` with the original message; anything else collapses to
/// an opaque `internal` status.
pub fn handle_list_readings(
    svc: &ReadingQueryService,
    req: &ListReadingsRequest,
) -> Result<ListReadingsResponse, RpcStatus> {
    let start = decode_optional_timestamp(req.start.as_deref()).map_err(|_| RpcStatus {
        code: RpcCode::InvalidArgument,
        message: "invalid start timestamp".to_string(),
    })?;
    let end = decode_optional_timestamp(req.end.as_deref()).map_err(|_| RpcStatus {
        code: RpcCode::InvalidArgument,
        message: "invalid end timestamp".to_string(),
    })?;

    let page = svc
        .list_readings_page(start, end, req.page_size, &req.page_token)
        .map_err(|e| RpcStatus {
            code: RpcCode::InvalidArgument,
            message: e.to_string(),
        })?;

    let mut readings = Vec::with_capacity(page.readings.len());
    for r in &page.readings {
        let time = wire::format_timestamp(r.ts).map_err(|_| RpcStatus {
            code: RpcCode::Internal,
            message: "internal error".to_string(),
        })?;
        readings.push(WireReading {
            time,
            usage: r.usage,
        });
    }

    Ok(ListReadingsResponse {
        readings,
        // Opaque to this layer; passed through verbatim.
        next_page_token: page.next_page_token,
    })
}

fn decode_optional_timestamp(
    v: Option<&str>,
) -> Result<Option<time::OffsetDateTime>, time::error::Parse> {
    match v {
        None => Ok(None),
        Some("") => Ok(None),
        Some(s) => wire::parse_timestamp(s).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meter_store::{Reading, ReadingStore};
    use std::sync::Arc;
    use time::macros::datetime;

    fn svc() -> ReadingQueryService {
        ReadingQueryService::new(Arc::new(ReadingStore::new(vec![
            Reading {
                ts: datetime!(2019-01-01 00:15:00 UTC),
                usage: 1.1,
            },
            Reading {
                ts: datetime!(2019-01-01 00:30:00 UTC),
                usage: 2.2,
            },
        ])))
    }

    #[test]
    fn returns_rfc3339_times_and_passes_token_through() {
        let svc = svc();
        let resp = handle_list_readings(
            &svc,
            &ListReadingsRequest {
                page_size: 1,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(resp.readings.len(), 1);
        assert_eq!(resp.readings[0].time, "2019-01-01T00:15:00Z");
        assert_eq!(resp.readings[0].usage, 1.1);
        assert!(!resp.next_page_token.is_empty());
    }

    #[test]
    fn rejects_malformed_wire_timestamp() {
        let svc = svc();
        let err = handle_list_readings(
            &svc,
            &ListReadingsRequest {
                start: Some("not-a-time".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();

        assert_eq!(err.code, RpcCode::InvalidArgument);
        assert!(err.message.contains("start"));
    }

    #[test]
    fn maps_domain_validation_to_invalid_argument_with_message() {
        let svc = svc();
        let err = handle_list_readings(
            &svc,
            &ListReadingsRequest {
                start: Some("2019-01-02T00:00:00Z".to_string()),
                end: Some("2019-01-01T00:00:00Z".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();

        assert_eq!(err.code, RpcCode::InvalidArgument);
        assert!(err.message.contains("start must be before end"));
    }

    #[test]
    fn empty_string_bounds_are_treated_as_absent() {
        let svc = svc();
        let resp = handle_list_readings(
            &svc,
            &ListReadingsRequest {
                start: Some(String::new()),
                end: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(resp.readings.len(), 2);
    }
}
