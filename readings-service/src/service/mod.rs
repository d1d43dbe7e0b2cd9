use std::sync::Arc;

use meter_store::{Reading, ReadingStore};
use time::{Duration, OffsetDateTime};

/// Guardrail against accidentally returning huge responses when pagination
/// is not used.
pub const MAX_UNPAGED_RANGE: Duration = Duration::days(31);
pub const MAX_PAGE_SIZE: i32 = 5_000;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
}

#[derive(Debug, Default)]
pub struct PageResult {
    pub readings: Vec<Reading>,
    /// Empty when the returned page is the last one for the range.
    pub next_page_token: String,
}

/// Range + pagination queries over an immutable `ReadingStore`.
///
/// The page token is the timestamp of the last reading returned on the
/// previous page, treated as an exclusive lower bound on the next page.
/// A timestamp cursor stays stable across store reloads, unlike a
/// positional offset. Callers must treat the token as opaque.
pub struct ReadingQueryService {
    store: Arc<ReadingStore>,
}

impl ReadingQueryService {
    pub fn new(store: Arc<ReadingStore>) -> Self {
        Self { store }
    }

    /// Unpaged listing of `[start, end)`.
    pub fn list_readings(
        &self,
        start_inclusive: Option<OffsetDateTime>,
        end_exclusive: Option<OffsetDateTime>,
    ) -> Result<Vec<Reading>, QueryError> {
        self.list_readings_page(start_inclusive, end_exclusive, 0, "")
            .map(|p| p.readings)
    }

    /// One page of `[start, end)`.
    ///
    /// `page_size == 0` means unpaged: the full filtered range comes back
    /// with an empty token. The validation order matters; the token decode
    /// assumes the size checks already passed.
    pub fn list_readings_page(
        &self,
        start_inclusive: Option<OffsetDateTime>,
        end_exclusive: Option<OffsetDateTime>,
        page_size: i32,
        page_token: &str,
    ) -> Result<PageResult, QueryError> {
        if let (Some(start), Some(end)) = (start_inclusive, end_exclusive) {
            // Keep it strict and predictable: [start, end) where start must be before end.
            if start >= end {
                return Err(QueryError::InvalidTimeRange(
                    "start must be before end".to_string(),
                ));
            }
            if page_size <= 0 && end - start > MAX_UNPAGED_RANGE {
                return Err(QueryError::InvalidTimeRange(format!(
                    "range too large without pagination (max {MAX_UNPAGED_RANGE})"
                )));
            }
        }

        if page_size < 0 {
            return Err(QueryError::InvalidPagination(
                "page_size must be >= 0".to_string(),
            ));
        }
        if page_size > MAX_PAGE_SIZE {
            return Err(QueryError::InvalidPagination(format!(
                "page_size too large (max {MAX_PAGE_SIZE})"
            )));
        }

        let cursor = decode_page_token(page_size, page_token)?;

        let effective_start = match (start_inclusive, cursor) {
            (Some(start), Some(cur)) => Some(start.max(cur)),
            (None, Some(cur)) => Some(cur),
            (start, None) => start,
        };

        let mut readings = self.store.list(effective_start, end_exclusive);

        if let Some(cur) = cursor {
            // The cursor is exclusive. Readings sharing its exact timestamp
            // were already delivered on the previous page.
            let skip = readings
                .iter()
                .position(|r| r.ts > cur)
                .unwrap_or(readings.len());
            readings.drain(..skip);
        }

        // Unpaged behavior (backwards compatible): return everything.
        if page_size == 0 {
            return Ok(PageResult {
                readings,
                next_page_token: String::new(),
            });
        }

        let limit = page_size as usize;
        let mut next_page_token = String::new();
        if readings.len() > limit {
            readings.truncate(limit);
            if let Some(last) = readings.last() {
                next_page_token = encode_page_token(last.ts);
            }
        }

        Ok(PageResult {
            readings,
            next_page_token,
        })
    }
}

fn encode_page_token(ts: OffsetDateTime) -> String {
    ts.unix_timestamp_nanos().to_string()
}

fn decode_page_token(page_size: i32, page_token: &str) -> Result<Option<OffsetDateTime>, QueryError> {
    if page_token.is_empty() {
        return Ok(None);
    }
    if page_size <= 0 {
        return Err(QueryError::InvalidPagination(
            "page_token requires page_size".to_string(),
        ));
    }
    let nanos: i128 = page_token
        .parse()
        .map_err(|_| QueryError::InvalidPagination("invalid page_token".to_string()))?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map(Some)
        .map_err(|_| QueryError::InvalidPagination("invalid page_token".to_string()))
}
