//! Parser workers - Extract structured records from raw log lines
//!
//! Any number of parser workers drain the same raw-line queue and feed the
//! same record queue. Each line is processed by exactly one worker and the
//! workers share no mutable state besides the queues, so adding workers is
//! always safe.
//!
//! ## Failure taxonomy
//!
//! - **Structural**: the record cannot be meaningfully built (pattern
//!   mismatch, bad timestamp, malformed request line, unparsable target).
//!   The line is dropped, the error counter incremented exactly once, and
//!   the raw text logged for diagnosis. The worker never halts.
//! - **Soft numeric**: bytes-sent and the two timing fields parse
//!   best-effort; an unparsable value (commonly `-`) degrades to zero so an
//!   otherwise-valid record is not lost over one bad number.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, TimeZone};
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::AccessRecord;
use crate::actors::counter::CounterHandle;

/// Extraction pattern for one access-log line, 13 capture groups:
/// client address, ident, user, timestamp, scheme, request line, status,
/// bytes sent, referrer, user agent, dash/numeric field, upstream time,
/// request time.
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"([\d\.]+)\s+([^ \[]+)\s+([^ \[]+)\s+\[([^\]]+)\]\s+([a-z]+)\s+"([^"]+)"\s+(\d{3})\s+(\d+)\s+"([^"]+)"\s+"(.*?)"\s+"([\d\.-]+)"\s+([\d\.-]+)\s+([\d\.-]+)"#,
    )
    .expect("log line pattern must compile")
});

/// Layout of the timestamp field, e.g. `04/Mar/2018:13:49:52 +0000`.
const TIMESTAMP_LAYOUT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// The upstream servers write their logs with a zero UTC offset but run on
/// Shanghai wall-clock time. Interpreting timestamps in UTC+8 is a fixed
/// business rule, not a tunable.
static BUSINESS_ZONE: LazyLock<FixedOffset> =
    LazyLock::new(|| FixedOffset::east_opt(8 * 3600).expect("fixed business zone offset"));

/// Base used to resolve origin-form request targets like `/foo?q=t`.
static TARGET_BASE: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("http://log-origin.invalid/").expect("target base url must parse")
});

/// Why a line was dropped. All variants are structural failures; soft
/// numeric failures never produce a rejection.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseRejection {
    /// The extraction pattern did not match the line.
    PatternMismatch,

    /// The timestamp field did not match the expected layout.
    BadTimestamp(String),

    /// The request line did not split into exactly method, target and
    /// protocol.
    BadRequestLine(String),

    /// The request target could not be parsed as a URL.
    BadTarget(String),
}

impl fmt::Display for ParseRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseRejection::PatternMismatch => write!(f, "line does not match the log pattern"),
            ParseRejection::BadTimestamp(text) => write!(f, "unparsable timestamp: {text}"),
            ParseRejection::BadRequestLine(text) => {
                write!(f, "request line is not \"METHOD TARGET PROTOCOL\": {text}")
            }
            ParseRejection::BadTarget(text) => write!(f, "unparsable request target: {text}"),
        }
    }
}

impl std::error::Error for ParseRejection {}

/// Parse one raw line into an [`AccessRecord`].
///
/// Structural failures reject the whole line; numeric fields degrade to
/// zero instead of rejecting (see the module docs for the taxonomy).
pub fn parse_line(line: &str) -> Result<AccessRecord, ParseRejection> {
    let caps = LINE_PATTERN
        .captures(line)
        .ok_or(ParseRejection::PatternMismatch)?;

    let timestamp_text = &caps[4];
    // The offset text is validated against the layout, then discarded: the
    // wall-clock fields are re-anchored in the business zone.
    let parsed = DateTime::parse_from_str(timestamp_text, TIMESTAMP_LAYOUT)
        .map_err(|_| ParseRejection::BadTimestamp(timestamp_text.to_string()))?;
    let timestamp = BUSINESS_ZONE
        .from_local_datetime(&parsed.naive_local())
        .single()
        .ok_or_else(|| ParseRejection::BadTimestamp(timestamp_text.to_string()))?;

    let request_line = &caps[6];
    let tokens: Vec<&str> = request_line.split_whitespace().collect();
    let [method, target, _protocol] = tokens.as_slice() else {
        return Err(ParseRejection::BadRequestLine(request_line.to_string()));
    };

    let target_url = Url::options()
        .base_url(Some(&TARGET_BASE))
        .parse(target)
        .map_err(|_| ParseRejection::BadTarget(target.to_string()))?;

    // Soft numeric fields: degrade to zero, never reject.
    let bytes_sent = caps[8].parse::<u64>().unwrap_or(0);
    let upstream_time = caps[12].parse::<f64>().unwrap_or(0.0);
    let request_time = caps[13].parse::<f64>().unwrap_or(0.0);

    Ok(AccessRecord {
        timestamp,
        bytes_sent,
        path: target_url.path().to_string(),
        method: method.to_string(),
        scheme: caps[5].to_string(),
        status: caps[7].to_string(),
        upstream_time,
        request_time,
    })
}

/// One parser worker.
///
/// Pulls raw lines from the shared input queue, parses them, and pushes
/// records onto the shared output queue. Pushing into a full queue blocks,
/// propagating slowness upstream to the tailer.
pub struct ParserWorker {
    raw_rx: flume::Receiver<String>,
    record_tx: flume::Sender<AccessRecord>,
    counter: CounterHandle,
}

impl ParserWorker {
    pub fn new(
        raw_rx: flume::Receiver<String>,
        record_tx: flume::Sender<AccessRecord>,
        counter: CounterHandle,
    ) -> Self {
        Self {
            raw_rx,
            record_tx,
            counter,
        }
    }

    /// Run until the raw-line queue closes.
    pub async fn run(self) {
        debug!("starting parser worker");

        while let Ok(line) = self.raw_rx.recv_async().await {
            match parse_line(&line) {
                Ok(record) => {
                    if self.record_tx.send_async(record).await.is_err() {
                        warn!("record queue closed, shutting down");
                        break;
                    }
                }
                Err(rejection) => {
                    self.counter.parse_error().await;
                    warn!(%rejection, %line, "dropping malformed line");
                }
            }
        }

        debug!("parser worker stopped");
    }
}
