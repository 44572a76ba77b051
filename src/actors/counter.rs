//! CounterActor - Serializes increments of the pipeline counters
//!
//! The hot path of the pipeline increments a counter for every line read and
//! every line rejected. Guarding shared totals with a lock would put that
//! lock on the hottest path in the system, so the totals are owned by a
//! single actor instead: exactly one task mutates them, and everything else
//! sends increment events over a bounded channel.
//!
//! ## Message Flow
//!
//! ```text
//! Tailer ──LineHandled──┐
//!                       ├──> CounterActor (owns the totals)
//! Parser ──ParseError───┘         ↑
//!                                 └─── Commands (GetTotals, Shutdown)
//! ```

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::messages::{CounterCommand, CounterEvent, CounterTotals};

/// Capacity of the increment channel. Matches the queue sizing of the rest
/// of the pipeline so a stalled counter throttles producers instead of
/// growing without bound.
const EVENT_CHANNEL_CAPACITY: usize = 200;

/// Capacity of the command channel (low-volume read path).
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Actor owning the two monotonic pipeline counters.
///
/// Increment events and read commands arrive on separate channels so the
/// high-volume increment stream never competes with snapshot reads for
/// channel slots.
pub struct CounterActor {
    /// Increment event receiver (hot path)
    event_rx: mpsc::Receiver<CounterEvent>,

    /// Command receiver (read path)
    command_rx: mpsc::Receiver<CounterCommand>,

    /// The totals. Only this actor ever writes them.
    totals: CounterTotals,
}

impl CounterActor {
    fn new(
        event_rx: mpsc::Receiver<CounterEvent>,
        command_rx: mpsc::Receiver<CounterCommand>,
    ) -> Self {
        Self {
            event_rx,
            command_rx,
            totals: CounterTotals::default(),
        }
    }

    /// Run the actor's main loop until shutdown or both channels close.
    pub async fn run(mut self) {
        debug!("starting counter actor");

        loop {
            tokio::select! {
                // Drain pending increments before answering reads so a
                // totals query sent after an increment always observes it.
                biased;

                event = self.event_rx.recv() => {
                    match event {
                        Some(CounterEvent::LineHandled) => {
                            self.totals.lines_handled += 1;
                        }
                        Some(CounterEvent::ParseError) => {
                            self.totals.parse_errors += 1;
                        }
                        None => {
                            warn!("event channel closed, shutting down");
                            break;
                        }
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        CounterCommand::GetTotals { respond_to } => {
                            let _ = respond_to.send(self.totals);
                        }
                        CounterCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("counter actor stopped");
    }
}

/// Handle for reporting to and querying the counter actor.
///
/// Cloneable; the top-level assembly constructs one handle and threads it
/// into every component that reports metrics.
#[derive(Clone)]
pub struct CounterHandle {
    event_tx: mpsc::Sender<CounterEvent>,
    command_tx: mpsc::Sender<CounterCommand>,
}

impl CounterHandle {
    /// Spawn a new counter actor and return its handle.
    pub fn spawn() -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let actor = CounterActor::new(event_rx, command_rx);

        tokio::spawn(actor.run());

        Self {
            event_tx,
            command_tx,
        }
    }

    /// Report one handled line.
    ///
    /// Suspends if the counter actor is backed up; producers are throttled
    /// rather than increments dropped.
    pub async fn line_handled(&self) {
        let _ = self.event_tx.send(CounterEvent::LineHandled).await;
    }

    /// Report one structural parse failure.
    pub async fn parse_error(&self) {
        let _ = self.event_tx.send(CounterEvent::ParseError).await;
    }

    /// Read the current totals.
    ///
    /// Returns `None` if the actor has shut down.
    pub async fn totals(&self) -> Option<CounterTotals> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(CounterCommand::GetTotals { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()
    }

    /// Gracefully shut down the counter actor.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(CounterCommand::Shutdown).await;
    }
}
