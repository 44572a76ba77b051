//! MonitorActor - Observes the pipeline without participating in it
//!
//! The monitor runs two independent periodic activities plus one on-demand
//! read path:
//!
//! 1. Every sample interval it appends the current "lines handled" total to
//!    a sliding window holding the two most recent samples; that window is
//!    the sole input to throughput computation.
//! 2. On each `Snapshot` command it assembles a [`SystemSnapshot`] from the
//!    counter totals, the current queue depths, and the window.
//!
//! Reads are pure observations: there is no write path from the monitor
//! back into pipeline state. Queue depths come from sender clones whose
//! `len()` never blocks the workers draining those queues.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, trace, warn};

use crate::AccessRecord;

use super::counter::CounterHandle;
use super::messages::{MonitorCommand, SystemSnapshot};

/// Number of samples retained for throughput computation.
const THROUGHPUT_WINDOW: usize = 2;

/// Actor sampling the pipeline counters and serving snapshots.
pub struct MonitorActor {
    /// Handle to the counter actor owning the totals
    counter: CounterHandle,

    /// Sender side of the raw-line queue, held only for depth reads
    raw_tx: flume::Sender<String>,

    /// Sender side of the record queue, held only for depth reads
    record_tx: flume::Sender<AccessRecord>,

    /// Command receiver
    command_rx: mpsc::Receiver<MonitorCommand>,

    /// When the pipeline was assembled
    started_at: Instant,

    /// Interval between throughput samples
    sample_interval: Duration,

    /// The two most recent "lines handled" samples, oldest first
    samples: Vec<u64>,
}

impl MonitorActor {
    fn new(
        counter: CounterHandle,
        raw_tx: flume::Sender<String>,
        record_tx: flume::Sender<AccessRecord>,
        command_rx: mpsc::Receiver<MonitorCommand>,
        sample_interval: Duration,
    ) -> Self {
        Self {
            counter,
            raw_tx,
            record_tx,
            command_rx,
            started_at: Instant::now(),
            sample_interval,
            samples: Vec::with_capacity(THROUGHPUT_WINDOW + 1),
        }
    }

    /// Run the actor's main loop until shutdown or the command channel
    /// closes.
    pub async fn run(mut self) {
        debug!("starting monitor actor");

        let mut ticker = interval(self.sample_interval);
        // The first tick fires immediately; skip it so the first window
        // spans a full interval.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.take_sample().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(MonitorCommand::Snapshot { respond_to }) => {
                            let snapshot = self.snapshot().await;
                            let _ = respond_to.send(snapshot);
                        }
                        Some(MonitorCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }
                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("monitor actor stopped");
    }

    /// Append the current handled-line total to the sliding window.
    async fn take_sample(&mut self) {
        let Some(totals) = self.counter.totals().await else {
            warn!("counter actor gone, skipping sample");
            return;
        };

        self.samples.push(totals.lines_handled);
        if self.samples.len() > THROUGHPUT_WINDOW {
            self.samples.remove(0);
        }

        trace!(samples = ?self.samples, "took throughput sample");
    }

    /// Assemble a snapshot of the pipeline's current state.
    async fn snapshot(&self) -> SystemSnapshot {
        let totals = self.counter.totals().await.unwrap_or_default();

        SystemSnapshot {
            lines_handled: totals.lines_handled,
            parse_errors: totals.parse_errors,
            raw_queue_len: self.raw_tx.len(),
            record_queue_len: self.record_tx.len(),
            throughput: compute_throughput(&self.samples, self.sample_interval),
            uptime: format_uptime(self.started_at.elapsed()),
        }
    }
}

/// Throughput over the sliding window, in lines per second.
///
/// Defined as zero until two samples exist.
fn compute_throughput(samples: &[u64], sample_interval: Duration) -> f64 {
    if samples.len() < THROUGHPUT_WINDOW {
        return 0.0;
    }

    let oldest = samples[0];
    let newest = samples[samples.len() - 1];
    (newest.saturating_sub(oldest)) as f64 / sample_interval.as_secs_f64()
}

/// Render an uptime duration as `XhYmZs`, omitting leading zero units.
fn format_uptime(uptime: Duration) -> String {
    let total_secs = uptime.as_secs();
    if total_secs == 0 {
        return format!("{}ms", uptime.subsec_millis());
    }

    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Handle for querying the monitor actor.
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
}

impl MonitorHandle {
    /// Spawn a new monitor actor observing the given counter and queues.
    pub fn spawn(
        counter: CounterHandle,
        raw_tx: flume::Sender<String>,
        record_tx: flume::Sender<AccessRecord>,
        sample_interval: Duration,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = MonitorActor::new(counter, raw_tx, record_tx, cmd_rx, sample_interval);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Assemble a snapshot of the pipeline's current state.
    ///
    /// Returns `None` if the actor has shut down.
    pub async fn snapshot(&self) -> Option<SystemSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::Snapshot { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()
    }

    /// Gracefully shut down the monitor actor.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(MonitorCommand::Shutdown).await;
    }
}
