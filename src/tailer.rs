//! Tailer - Follows an actively appended log file
//!
//! The tailer owns the file descriptor exclusively. It starts at the
//! current end of the file (startup never re-processes historical content)
//! and polls for new lines, sleeping briefly whenever the file has no new
//! data. Polling is a deliberate simplicity/latency trade-off: append rates
//! are modest and sub-second latency is not required.
//!
//! Rotation, truncation and deletion of the tailed file are not handled.

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::actors::counter::CounterHandle;

/// A producer of raw log lines.
///
/// Abstracting the source lets an alternate implementation (e.g. a network
/// listener) feed the same parser stage without touching it.
#[async_trait]
pub trait LogSource: Send {
    /// Produce lines into `lines` until an unrecoverable error occurs.
    ///
    /// Returning `Err` is fatal for the whole process; there is no
    /// meaningful recovery without the source.
    async fn run(self: Box<Self>, lines: flume::Sender<String>) -> Result<()>;
}

/// Tails a single file by polling.
pub struct FileTailer {
    path: PathBuf,
    poll_interval: Duration,
    counter: CounterHandle,
}

impl FileTailer {
    pub fn new(path: PathBuf, poll_interval: Duration, counter: CounterHandle) -> Self {
        Self {
            path,
            poll_interval,
            counter,
        }
    }
}

#[async_trait]
impl LogSource for FileTailer {
    async fn run(self: Box<Self>, lines: flume::Sender<String>) -> Result<()> {
        let file = File::open(&self.path)
            .await
            .with_context(|| format!("failed to open {}", self.path.display()))?;

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::End(0))
            .await
            .with_context(|| format!("failed to seek {} to end", self.path.display()))?;

        info!(path = %self.path.display(), "starting tailer at end of file");

        let mut buf = String::new();
        loop {
            let read = reader
                .read_line(&mut buf)
                .await
                .with_context(|| format!("failed to read from {}", self.path.display()))?;

            // A line is only complete once its newline has been written; a
            // partial tail stays in the buffer and is finished by a later
            // read. `read == 0` means no new data at all.
            if read == 0 || !buf.ends_with('\n') {
                sleep(self.poll_interval).await;
                continue;
            }

            let line = buf.trim_end_matches(['\n', '\r']).to_string();
            buf.clear();

            self.counter.line_handled().await;

            // The only intentional backpressure point: a full queue blocks
            // the tailer instead of dropping data.
            if lines.send_async(line).await.is_err() {
                warn!("raw line queue closed, shutting down");
                return Ok(());
            }
        }
    }
}
