//! Pipeline assembly
//!
//! Builds the two bounded queues, spawns the tailer, the parser workers and
//! the emitter workers, and hands out what the monitor needs to observe the
//! flow. Data moves strictly source -> parsers -> emitters; the monitor
//! only ever reads queue depths.

use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::AccessRecord;
use crate::actors::counter::CounterHandle;
use crate::config::PipelineConfig;
use crate::emitter::EmitterWorker;
use crate::parser::ParserWorker;
use crate::sink::RecordSink;
use crate::tailer::LogSource;

/// A running pipeline.
///
/// Holds sender clones for depth observation and the source task's join
/// handle: a source error is the pipeline's fatal path.
pub struct Pipeline {
    /// Sender side of the raw-line queue (depth observation)
    pub raw_tx: flume::Sender<String>,

    /// Sender side of the record queue (depth observation)
    pub record_tx: flume::Sender<AccessRecord>,

    /// The source task. Resolves only on unrecoverable source failure.
    pub source: JoinHandle<Result<()>>,

    /// Parser and emitter worker tasks; run until their input queue closes.
    pub workers: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Spawn the full pipeline.
    ///
    /// Worker counts below one are raised to one; a stage with zero workers
    /// would silently stall the whole flow.
    pub fn spawn(
        config: &PipelineConfig,
        source: Box<dyn LogSource>,
        sink: Arc<dyn RecordSink>,
        counter: CounterHandle,
    ) -> Self {
        let (raw_tx, raw_rx) = flume::bounded::<String>(config.queue_capacity);
        let (record_tx, record_rx) = flume::bounded::<AccessRecord>(config.queue_capacity);

        let parser_workers = config.parser_workers.max(1);
        let emitter_workers = config.emitter_workers.max(1);

        debug!(
            queue_capacity = config.queue_capacity,
            parser_workers, emitter_workers, "assembling pipeline"
        );

        let mut workers = Vec::with_capacity(parser_workers + emitter_workers);

        for _ in 0..parser_workers {
            let worker = ParserWorker::new(raw_rx.clone(), record_tx.clone(), counter.clone());
            workers.push(tokio::spawn(worker.run()));
        }

        for _ in 0..emitter_workers {
            let worker = EmitterWorker::new(record_rx.clone(), sink.clone(), config.emit_batch_size);
            workers.push(tokio::spawn(worker.run()));
        }

        let source = tokio::spawn(source.run(raw_tx.clone()));

        Self {
            raw_tx,
            record_tx,
            source,
            workers,
        }
    }
}
