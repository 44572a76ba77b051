//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Events**: fire-and-forget increments sent to the counter actor via
//!    a bounded mpsc channel
//! 2. **Commands**: request/response messages answered over oneshot channels
//! 3. **Single writer**: the totals live inside the counter actor; every
//!    other component can only request increments, never touch them

use serde::Serialize;
use tokio::sync::oneshot;

/// A single increment request for the metric counter.
///
/// Every component reporting metrics sends these through a [`CounterHandle`];
/// the counter actor is the only task that ever mutates the totals.
///
/// [`CounterHandle`]: super::counter::CounterHandle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterEvent {
    /// One raw line was read from the tailed file.
    LineHandled,

    /// One line was dropped due to a structural parse failure.
    ParseError,
}

/// Commands understood by the counter actor.
#[derive(Debug)]
pub enum CounterCommand {
    /// Read the current totals.
    GetTotals {
        respond_to: oneshot::Sender<CounterTotals>,
    },

    /// Gracefully shut down the counter actor.
    Shutdown,
}

/// Point-in-time copy of the two monotonic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterTotals {
    pub lines_handled: u64,
    pub parse_errors: u64,
}

/// Commands understood by the monitor actor.
#[derive(Debug)]
pub enum MonitorCommand {
    /// Assemble a snapshot of the pipeline's current state.
    Snapshot {
        respond_to: oneshot::Sender<SystemSnapshot>,
    },

    /// Gracefully shut down the monitor actor.
    Shutdown,
}

/// Read-only view of the whole system, assembled on demand.
///
/// The wire keys match the legacy monitoring payload consumed by existing
/// dashboards, hence the renames.
#[derive(Debug, Clone, Serialize)]
pub struct SystemSnapshot {
    /// Total lines read from the tailed file.
    #[serde(rename = "handleLine")]
    pub lines_handled: u64,

    /// Computed throughput in lines per second.
    #[serde(rename = "tps")]
    pub throughput: f64,

    /// Pending depth of the raw-line queue.
    #[serde(rename = "readChanLen")]
    pub raw_queue_len: usize,

    /// Pending depth of the parsed-record queue.
    #[serde(rename = "writeChanLen")]
    pub record_queue_len: usize,

    /// Human-readable process uptime.
    #[serde(rename = "runTime")]
    pub uptime: String,

    /// Total lines dropped due to structural parse failures.
    #[serde(rename = "errNum")]
    pub parse_errors: u64,
}
