pub mod actors;
pub mod api;
pub mod config;
pub mod emitter;
pub mod parser;
pub mod pipeline;
pub mod sink;
pub mod tailer;

use chrono::{DateTime, FixedOffset};

/// One fully parsed access-log entry.
///
/// A record is either fully populated or never constructed: the parser only
/// hands out records for lines that passed every structural check. Records
/// are moved, never shared; exactly one emitter worker consumes each one.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessRecord {
    /// Request timestamp, interpreted in the fixed business time zone.
    pub timestamp: DateTime<FixedOffset>,

    /// Bytes transferred for the request. Zero when the log field was
    /// unparsable (soft failure).
    pub bytes_sent: u64,

    /// URL path component only; query string and fragment are discarded.
    pub path: String,

    /// HTTP verb token, copied verbatim.
    pub method: String,

    /// Protocol token taken verbatim from the log (e.g. "http").
    pub scheme: String,

    /// HTTP status code kept as a 3-digit string. It is only ever used as a
    /// categorical tag, never as a number.
    pub status: String,

    /// Upstream response time in seconds; zero when the field was `-` or
    /// unparsable.
    pub upstream_time: f64,

    /// Total request time in seconds; zero when the field was `-` or
    /// unparsable.
    pub request_time: f64,
}
