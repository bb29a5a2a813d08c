//! VNFeed Runner — drives the connector building blocks through one sync.
//!
//! This crate builds on `vnfeed-core` to provide:
//! - The sync state machine (listing → per-identifier fetch → completed)
//! - The connection pre-flight check
//! - Cursor-state persistence between runs
//! - Record sinks (JSONL, CSV, in-memory)
//! - The stream registry mapping stream names to lister/fetcher wiring

pub mod check;
pub mod export;
pub mod state_store;
pub mod streams;
pub mod sync;

pub use check::{check_connection, CheckOutcome};
pub use export::{CsvSink, ExportError, JsonlSink, RecordSink, VecSink};
pub use state_store::{StateError, StateStore};
pub use streams::{build_stream, StreamKind};
pub use sync::{
    run_sync, CancelToken, JobKind, NullProgress, SkippedTicker, StdoutProgress, SyncJob,
    SyncPhase, SyncProgress, SyncReport,
};
