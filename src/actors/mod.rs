//! Actor-based self-monitoring for the pipeline
//!
//! The pipeline's counters and snapshot assembly run as independent async
//! tasks communicating via Tokio channels. No component ever touches the
//! totals directly; ownership of all mutable monitoring state is confined
//! to exactly one actor.
//!
//! ## Architecture Overview
//!
//! ```text
//!   Tailer ──┐ increments                 ┌── GET /monitor
//!            ├──────> CounterActor <──────┤
//!   Parser ──┘        (owns totals)       │ GetTotals
//!                          ▲              │
//!                          │ sample       │
//!                     MonitorActor <──────┘ Snapshot
//!                 (window, queue depths)
//! ```
//!
//! ## Actor Types
//!
//! - **CounterActor**: serializes increments of the two pipeline counters
//! - **MonitorActor**: samples throughput and assembles system snapshots
//!
//! ## Communication Patterns
//!
//! 1. **Events**: fire-and-forget increments over a bounded mpsc channel
//! 2. **Commands**: control messages per actor over a dedicated mpsc channel
//! 3. **Request/Response**: oneshot channels for synchronous queries

pub mod counter;
pub mod messages;
pub mod monitor;
