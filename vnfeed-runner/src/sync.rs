//! The sync state machine.
//!
//! One run walks `NotStarted → Listing → PerIdentifierFetch → Completed`,
//! with a terminal `Failed` reachable from any non-terminal phase. The
//! listing call is fatal on failure; per-ticker fetches fail under the
//! configured error policy (skip and continue, or abort). Records from
//! incremental streams are routed through the cursor tracker, sorted
//! ascending per batch so out-of-order pages cannot shadow older records.
//!
//! The whole machine is synchronous and single-threaded: one identifier at
//! a time, one request in flight. Cancellation is cooperative — the token
//! is checked between tickers, so an abort lands after the current
//! in-flight request and the cursor stays at its last admitted value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use vnfeed_core::config::ErrorPolicy;
use vnfeed_core::cursor::{CursorState, CursorTracker};
use vnfeed_core::error::FetchError;
use vnfeed_core::lister::Lister;
use vnfeed_core::record::Marker;
use vnfeed_core::transport::Transport;
use vnfeed_core::connectors::Fetcher;

use crate::export::{ExportError, RecordSink};

/// Phases of one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    NotStarted,
    Listing,
    PerIdentifierFetch,
    Completed,
    Failed,
}

/// A ticker that was skipped mid-sync, with the error that caused it.
#[derive(Debug)]
pub struct SkippedTicker {
    pub ticker: String,
    pub error: FetchError,
}

/// Outcome of one sync run.
#[derive(Debug)]
pub struct SyncReport {
    pub stream: String,
    pub phase: SyncPhase,
    pub tickers_total: usize,
    pub tickers_synced: usize,
    pub records_emitted: usize,
    /// Records rejected by the cursor tracker as duplicates/stale.
    pub records_stale: usize,
    /// Records on an incremental stream that had no usable cursor field.
    pub records_missing_marker: usize,
    pub skipped: Vec<SkippedTicker>,
    pub cancelled: bool,
    /// Final cursor snapshot for incremental streams.
    pub cursor: Option<CursorState>,
    /// Fatal error that moved the run to `Failed`, if any.
    pub failure: Option<String>,
}

impl SyncReport {
    fn new(stream: &str) -> Self {
        Self {
            stream: stream.to_string(),
            phase: SyncPhase::NotStarted,
            tickers_total: 0,
            tickers_synced: 0,
            records_emitted: 0,
            records_stale: 0,
            records_missing_marker: 0,
            skipped: Vec::new(),
            cancelled: false,
            cursor: None,
            failure: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.phase == SyncPhase::Completed
    }
}

/// Cooperative cancellation, checked at each request boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress callbacks for multi-ticker syncs.
pub trait SyncProgress {
    /// Called when starting to fetch a ticker.
    fn on_start(&self, ticker: &str, index: usize, total: usize);

    /// Called when a ticker fetch completes; `Ok` carries the emitted count.
    fn on_complete(
        &self,
        ticker: &str,
        index: usize,
        total: usize,
        result: &Result<usize, FetchError>,
    );

    /// Called when the whole run is done.
    fn on_batch_complete(&self, synced: usize, skipped: usize, total: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl SyncProgress for StdoutProgress {
    fn on_start(&self, ticker: &str, index: usize, total: usize) {
        println!("[{}/{}] Syncing {ticker}...", index + 1, total);
    }

    fn on_complete(
        &self,
        ticker: &str,
        _index: usize,
        _total: usize,
        result: &Result<usize, FetchError>,
    ) {
        match result {
            Ok(count) => println!("  OK: {ticker} ({count} new records)"),
            Err(e) => println!("  FAIL: {ticker}: {e}"),
        }
    }

    fn on_batch_complete(&self, synced: usize, skipped: usize, total: usize) {
        println!("\nSync complete: {synced}/{total} tickers, {skipped} skipped");
    }
}

/// No-op progress for embedding and tests.
pub struct NullProgress;

impl SyncProgress for NullProgress {
    fn on_start(&self, _: &str, _: usize, _: usize) {}
    fn on_complete(&self, _: &str, _: usize, _: usize, _: &Result<usize, FetchError>) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize) {}
}

/// How a stream's records are produced and filtered.
pub enum JobKind {
    /// The listing rows themselves are the records.
    Listing,
    /// One fetch per ticker, every record emitted.
    FullRefresh { fetcher: Box<dyn Fetcher> },
    /// One fetch per ticker, records admitted through a cursor tracker.
    Incremental {
        fetcher: Box<dyn Fetcher>,
        tracker: CursorTracker,
        seed: Marker,
    },
}

/// One stream wired up for a run.
pub struct SyncJob {
    pub stream: String,
    pub lister: Box<dyn Lister>,
    pub kind: JobKind,
}

/// Drive one sync job to completion.
pub fn run_sync(
    job: SyncJob,
    transport: &dyn Transport,
    policy: ErrorPolicy,
    cancel: &CancelToken,
    progress: &dyn SyncProgress,
    sink: &mut dyn RecordSink,
) -> SyncReport {
    let mut report = SyncReport::new(&job.stream);

    report.phase = SyncPhase::Listing;
    info!(stream = %job.stream, "listing identifiers");

    // Parent-only streams: the listing rows are the output.
    if matches!(job.kind, JobKind::Listing) {
        return run_listing_only(job, transport, sink, report);
    }

    // Listing failures are fatal to the whole sync.
    let tickers = match job.lister.list(transport) {
        Ok(tickers) => tickers,
        Err(e) => {
            warn!(stream = %report.stream, error = %e, "listing failed, aborting sync");
            report.phase = SyncPhase::Failed;
            report.failure = Some(format!("listing failed: {e}"));
            return report;
        }
    };
    report.tickers_total = tickers.len();

    let (fetcher, mut tracker) = match job.kind {
        JobKind::FullRefresh { fetcher } => (fetcher, None),
        JobKind::Incremental {
            fetcher,
            mut tracker,
            seed,
        } => {
            // Fresh trackers are seeded for the whole listing; restored ones
            // only pick up identifiers that drifted in since the last run.
            if tracker.is_empty() {
                tracker.initialize(&tickers, seed);
            } else {
                tracker.seed_missing(&tickers, seed);
            }
            (fetcher, Some(tracker))
        }
        JobKind::Listing => unreachable!("handled above"),
    };

    report.phase = SyncPhase::PerIdentifierFetch;
    let total = tickers.len();

    for (index, ticker) in tickers.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(stream = %report.stream, ticker, "cancelled before fetch");
            report.cancelled = true;
            break;
        }

        progress.on_start(ticker, index, total);

        let fetched = fetcher.fetch(transport, ticker);
        let outcome = match fetched {
            Ok(mut records) => {
                let emitted = match &mut tracker {
                    Some(tracker) => {
                        match admit_batch(tracker, &mut records, &mut report, sink) {
                            Ok(count) => count,
                            Err(e) => {
                                report.phase = SyncPhase::Failed;
                                report.failure = Some(format!("record sink failed: {e}"));
                                report.cursor = Some(tracker.snapshot());
                                return report;
                            }
                        }
                    }
                    None => match emit_all(&records, &mut report, sink) {
                        Ok(count) => count,
                        Err(e) => {
                            report.phase = SyncPhase::Failed;
                            report.failure = Some(format!("record sink failed: {e}"));
                            return report;
                        }
                    },
                };
                report.tickers_synced += 1;
                Ok(emitted)
            }
            Err(e) => Err(e),
        };

        progress.on_complete(ticker, index, total, &outcome);

        if let Err(e) = outcome {
            warn!(stream = %report.stream, ticker, error = %e, "ticker fetch failed");
            match policy {
                ErrorPolicy::SkipTicker => {
                    report.skipped.push(SkippedTicker {
                        ticker: ticker.clone(),
                        error: e,
                    });
                }
                ErrorPolicy::Abort => {
                    report.skipped.push(SkippedTicker {
                        ticker: ticker.clone(),
                        error: e,
                    });
                    report.phase = SyncPhase::Failed;
                    report.failure =
                        Some(format!("aborted on first failed ticker: {ticker}"));
                    if let Some(tracker) = tracker {
                        report.cursor = Some(tracker.snapshot());
                    }
                    progress.on_batch_complete(
                        report.tickers_synced,
                        report.skipped.len(),
                        total,
                    );
                    return report;
                }
            }
        }
    }

    if let Some(tracker) = tracker {
        report.cursor = Some(tracker.snapshot());
    }
    if !report.cancelled {
        report.phase = SyncPhase::Completed;
    }
    progress.on_batch_complete(report.tickers_synced, report.skipped.len(), total);
    info!(
        stream = %report.stream,
        emitted = report.records_emitted,
        stale = report.records_stale,
        skipped = report.skipped.len(),
        "sync finished"
    );
    report
}

fn run_listing_only(
    job: SyncJob,
    transport: &dyn Transport,
    sink: &mut dyn RecordSink,
    mut report: SyncReport,
) -> SyncReport {
    match job.lister.list_records(transport) {
        Ok(records) => {
            report.tickers_total = records.len();
            report.tickers_synced = records.len();
            match emit_all(&records, &mut report, sink) {
                Ok(_) => report.phase = SyncPhase::Completed,
                Err(e) => {
                    report.phase = SyncPhase::Failed;
                    report.failure = Some(format!("record sink failed: {e}"));
                }
            }
        }
        Err(e) => {
            warn!(stream = %report.stream, error = %e, "listing failed, aborting sync");
            report.phase = SyncPhase::Failed;
            report.failure = Some(format!("listing failed: {e}"));
        }
    }
    report
}

/// Route one fetched batch through the tracker, oldest marker first.
fn admit_batch(
    tracker: &mut CursorTracker,
    records: &mut Vec<vnfeed_core::record::Record>,
    report: &mut SyncReport,
    sink: &mut dyn RecordSink,
) -> Result<usize, ExportError> {
    tracker.sort_ascending(records);
    let mut emitted = 0;
    for record in records.iter() {
        if record.marker(tracker.cursor_field()).is_none() {
            debug!(ticker = record.ticker(), "record without cursor marker dropped");
            report.records_missing_marker += 1;
            continue;
        }
        if tracker.admit(record) {
            sink.write(record)?;
            report.records_emitted += 1;
            emitted += 1;
        } else {
            report.records_stale += 1;
        }
    }
    Ok(emitted)
}

fn emit_all(
    records: &[vnfeed_core::record::Record],
    report: &mut SyncReport,
    sink: &mut dyn RecordSink,
) -> Result<usize, ExportError> {
    for record in records {
        sink.write(record)?;
        report.records_emitted += 1;
    }
    Ok(records.len())
}
