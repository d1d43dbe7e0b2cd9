use time::OffsetDateTime;

/// A single meter usage observation at a point in time.
///
/// `usage` is guaranteed finite (NaN and ±inf are rejected at ingestion).
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub ts: OffsetDateTime,
    pub usage: f64,
}
