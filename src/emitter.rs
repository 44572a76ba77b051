//! Emitter workers - Hand parsed records to the time-series sink
//!
//! Any number of emitter workers drain the record queue. Delivery is
//! best-effort: a failed sink write is logged and the worker moves on to
//! the next record. There is no retry queue and no dead-letter path; the
//! only backpressure on the pipeline is the bounded queue itself.

use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::AccessRecord;
use crate::sink::{FieldValue, Point, RecordSink};

/// Measurement name under which every record is written.
const MEASUREMENT: &str = "nginx_log";

/// Map one record to a sink data point.
///
/// Tags carry the low-cardinality categorical dimensions, fields the
/// numeric measurements.
pub fn record_to_point(record: AccessRecord) -> Point {
    Point {
        measurement: MEASUREMENT,
        tags: vec![
            ("Path", record.path),
            ("Method", record.method),
            ("Scheme", record.scheme),
            ("Status", record.status),
        ],
        fields: vec![
            ("UpstreamTime", FieldValue::Float(record.upstream_time)),
            ("RequestTime", FieldValue::Float(record.request_time)),
            ("BytesSent", FieldValue::UnsignedInteger(record.bytes_sent)),
        ],
        timestamp: record.timestamp,
    }
}

/// One emitter worker.
pub struct EmitterWorker {
    record_rx: flume::Receiver<AccessRecord>,
    sink: Arc<dyn RecordSink>,

    /// Maximum records coalesced into one sink write. 1 reproduces the
    /// one-point-per-round-trip reference behavior.
    batch_size: usize,
}

impl EmitterWorker {
    pub fn new(
        record_rx: flume::Receiver<AccessRecord>,
        sink: Arc<dyn RecordSink>,
        batch_size: usize,
    ) -> Self {
        Self {
            record_rx,
            sink,
            batch_size: batch_size.max(1),
        }
    }

    /// Run until the record queue closes.
    pub async fn run(self) {
        debug!("starting emitter worker");

        while let Ok(record) = self.record_rx.recv_async().await {
            let mut points = Vec::with_capacity(self.batch_size);
            points.push(record_to_point(record));

            // Opportunistically coalesce whatever is already pending, up to
            // the batch limit; never wait for a batch to fill.
            while points.len() < self.batch_size {
                match self.record_rx.try_recv() {
                    Ok(record) => points.push(record_to_point(record)),
                    Err(_) => break,
                }
            }

            let batch_len = points.len();
            match self.sink.write(points).await {
                Ok(()) => trace!(batch_len, "batch written to sink"),
                Err(err) => {
                    // Best-effort sink: report and keep going.
                    error!(%err, batch_len, "sink write failed, dropping batch");
                }
            }
        }

        debug!("emitter worker stopped");
    }
}
