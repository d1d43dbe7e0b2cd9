use std::{fs::File, io::Read, path::Path};

use time::{format_description::FormatItem, macros::format_description, PrimitiveDateTime};

use crate::domain::Reading;
use crate::store::ReadingStore;

/// Timestamps in the CSV are local-less wall clock text, interpreted as UTC.
const TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("open csv {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("read csv: {0}")]
    Read(#[from] csv::Error),
    #[error("unexpected header {got:?} (want \"time,meterusage\")")]
    Header { got: String },
    #[error("no usable rows ({skipped} rows skipped)")]
    NoUsableRows { skipped: usize },
}

/// One rejected CSV row. Rows are skipped rather than failing the whole
/// load; callers decide whether to log or abort.
#[derive(Debug)]
pub struct RowError {
    pub row: u64,
    pub reason: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}

#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub readings: Vec<Reading>,
    pub skipped: Vec<RowError>,
}

/// Parses readings from CSV with header `time,meterusage`.
///
/// Invalid rows (bad timestamp, non-numeric or non-finite usage, missing
/// columns) are skipped and reported in `ParseOutcome::skipped`.
pub fn parse_readings<R: Read>(input: R) -> Result<ParseOutcome, CsvError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let header = rdr.headers()?.clone();
    let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
    if names.len() < 2 || names[0] != "time" || names[1] != "meterusage" {
        return Err(CsvError::Header {
            got: header.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut out = ParseOutcome::default();
    // Row numbers are 1-based and include the header, matching what a user
    // sees in an editor.
    let mut row_num: u64 = 1;

    for record in rdr.records() {
        row_num += 1;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                out.skipped.push(RowError {
                    row: row_num,
                    reason: format!("read: {e}"),
                });
                continue;
            }
        };
        if record.len() < 2 {
            out.skipped.push(RowError {
                row: row_num,
                reason: format!("expected 2 columns, got {}", record.len()),
            });
            continue;
        }

        let ts_str = record[0].trim();
        let ts = match PrimitiveDateTime::parse(ts_str, TIME_FORMAT) {
            Ok(t) => t.assume_utc(),
            Err(e) => {
                out.skipped.push(RowError {
                    row: row_num,
                    reason: format!("parse time {ts_str:?}: {e}"),
                });
                continue;
            }
        };

        let usage_str = record[1].trim();
        let usage: f64 = match usage_str.parse() {
            Ok(v) => v,
            Err(e) => {
                out.skipped.push(RowError {
                    row: row_num,
                    reason: format!("parse meterusage {usage_str:?}: {e}"),
                });
                continue;
            }
        };
        if !usage.is_finite() {
            out.skipped.push(RowError {
                row: row_num,
                reason: format!("invalid meterusage {usage}"),
            });
            continue;
        }

        out.readings.push(Reading { ts, usage });
    }

    Ok(out)
}

/// Loads a `ReadingStore` from a CSV file.
///
/// Partially bad files still load; the skipped rows are returned so the
/// caller can surface them. A non-empty file where every row is invalid is
/// treated as a hard error.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<(ReadingStore, Vec<RowError>), CsvError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CsvError::Open {
        path: path.display().to_string(),
        source: e,
    })?;

    let outcome = parse_readings(file)?;
    if outcome.readings.is_empty() && !outcome.skipped.is_empty() {
        return Err(CsvError::NoUsableRows {
            skipped: outcome.skipped.len(),
        });
    }

    Ok((ReadingStore::new(outcome.readings), outcome.skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_valid_rows() {
        let input = "time,meterusage\n2019-01-01 00:15:00,1.1\n2019-01-01 00:30:00,2.2\n";
        let out = parse_readings(input.as_bytes()).unwrap();

        assert!(out.skipped.is_empty());
        assert_eq!(out.readings.len(), 2);
        assert_eq!(out.readings[0].ts, datetime!(2019-01-01 00:15:00 UTC));
        assert_eq!(out.readings[0].usage, 1.1);
        assert_eq!(out.readings[1].usage, 2.2);
    }

    #[test]
    fn skips_invalid_rows_and_reports_them() {
        let input = concat!(
            "time,meterusage\n",
            "not-a-time,1.0\n",
            "2019-01-01 00:15:00,abc\n",
            "2019-01-01 00:30:00,NaN\n",
            "2019-01-01 00:45:00\n",
            "2019-01-01 01:00:00,4.4\n",
        );
        let out = parse_readings(input.as_bytes()).unwrap();

        assert_eq!(out.readings.len(), 1);
        assert_eq!(out.readings[0].usage, 4.4);
        assert_eq!(out.skipped.len(), 4);
        // Row numbers count the header as row 1.
        assert_eq!(out.skipped[0].row, 2);
        assert!(out.skipped[2].reason.contains("meterusage"));
    }

    #[test]
    fn rejects_unexpected_header() {
        let input = "timestamp,kwh\n2019-01-01 00:15:00,1.0\n";
        let err = parse_readings(input.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvError::Header { .. }));
    }

    #[test]
    fn rejects_infinite_usage() {
        let input = "time,meterusage\n2019-01-01 00:15:00,inf\n";
        let out = parse_readings(input.as_bytes()).unwrap();
        assert!(out.readings.is_empty());
        assert_eq!(out.skipped.len(), 1);
    }

    #[test]
    fn header_only_file_is_empty_but_ok() {
        let out = parse_readings("time,meterusage\n".as_bytes()).unwrap();
        assert!(out.readings.is_empty());
        assert!(out.skipped.is_empty());
    }
}
