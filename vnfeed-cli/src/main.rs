//! VNFeed CLI — check, list, and sync the market-data connector streams.
//!
//! Commands:
//! - `check` — validate the configuration, optionally probe the listing endpoint
//! - `streams` — print the stream catalog
//! - `sync` — run one stream to completion, writing JSONL or CSV artifacts
//! - `state status` / `state clear` — inspect or reset persisted cursors

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use vnfeed_core::config::ConnectorConfig;
use vnfeed_core::transport::HttpTransport;
use vnfeed_runner::export::{CsvSink, JsonlSink, RecordSink};
use vnfeed_runner::sync::{run_sync, CancelToken, JobKind, StdoutProgress, SyncPhase};
use vnfeed_runner::{build_stream, check_connection, StateStore, StreamKind};

#[derive(Parser)]
#[command(
    name = "vnfeed",
    about = "VNFeed CLI — Vietnamese stock-market data feed connectors"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and optionally probe the listing endpoint.
    Check {
        /// Path to a TOML config file. Defaults apply if omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also issue one cheap probe request.
        #[arg(long, default_value_t = false)]
        probe: bool,
    },
    /// Print the stream catalog.
    Streams,
    /// Run one stream to completion.
    Sync {
        /// Stream name (see `vnfeed streams`).
        stream: String,

        /// Path to a TOML config file. Defaults apply if omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for record artifacts.
        #[arg(long, default_value = "out")]
        output_dir: PathBuf,

        /// Artifact format: jsonl or csv.
        #[arg(long, default_value = "jsonl")]
        format: String,

        /// Cursor state file for incremental streams. Overrides the config's
        /// state_path; defaults to state.json.
        #[arg(long)]
        state: Option<PathBuf>,

        /// Ignore persisted cursor state and start from the seed markers.
        #[arg(long, default_value_t = false)]
        full_refresh: bool,

        /// Truncate the ticker list for a cheap test run.
        #[arg(long, default_value_t = false)]
        fast_mode: bool,

        /// Override the lookback window in days.
        #[arg(long)]
        days_before: Option<i64>,

        /// Override the range start (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Override the range end (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Fetch full history, ignoring any configured range.
        #[arg(long, default_value_t = false)]
        sync_all: bool,
    },
    /// Cursor-state management.
    State {
        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Show persisted cursor markers per stream.
    Status {
        /// Cursor state file.
        #[arg(long, default_value = "state.json")]
        state: PathBuf,
    },
    /// Delete persisted cursor state.
    Clear {
        /// Cursor state file.
        #[arg(long, default_value = "state.json")]
        state: PathBuf,

        /// Actually delete (without this flag, only previews).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config, probe } => run_check(config.as_deref(), probe),
        Commands::Streams => run_streams(),
        Commands::Sync {
            stream,
            config,
            output_dir,
            format,
            state,
            full_refresh,
            fast_mode,
            days_before,
            start,
            end,
            sync_all,
        } => {
            let overrides = Overrides {
                fast_mode,
                days_before,
                start,
                end,
                sync_all,
            };
            run_sync_cmd(
                &stream,
                config.as_deref(),
                &output_dir,
                &format,
                state,
                full_refresh,
                overrides,
            )
        }
        Commands::State { action } => match action {
            StateAction::Status { state } => run_state_status(&state),
            StateAction::Clear { state, confirm } => run_state_clear(&state, confirm),
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<ConnectorConfig> {
    match path {
        Some(path) => Ok(ConnectorConfig::from_file(path)?),
        None => Ok(ConnectorConfig::default()),
    }
}

fn run_check(config_path: Option<&Path>, probe: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let outcome = if probe {
        let transport = HttpTransport::from_config(&config);
        check_connection(&config, Some(&transport))
    } else {
        check_connection(&config, None)
    };

    println!(
        "{}: {}",
        if outcome.success { "PASSED" } else { "FAILED" },
        outcome.message
    );
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

fn run_streams() -> Result<()> {
    println!(
        "{:<28} {:<12} {}",
        "Stream", "Mode", "Description"
    );
    println!("{}", "-".repeat(76));
    for kind in StreamKind::ALL {
        let mode = if kind.is_incremental() {
            "incremental"
        } else {
            "full"
        };
        println!("{:<28} {:<12} {}", kind.name(), mode, kind.description());
    }
    Ok(())
}

/// Config values the sync command can override from the command line.
struct Overrides {
    fast_mode: bool,
    days_before: Option<i64>,
    start: Option<String>,
    end: Option<String>,
    sync_all: bool,
}

impl Overrides {
    fn apply(self, config: &mut ConnectorConfig) -> Result<()> {
        if self.fast_mode {
            config.fast_mode = true;
        }
        if let Some(days) = self.days_before {
            config.days_before = Some(days);
        }
        if let Some(start) = self.start.as_deref() {
            config.start_date = Some(NaiveDate::parse_from_str(start, "%Y-%m-%d")?);
        }
        if let Some(end) = self.end.as_deref() {
            config.end_date = Some(NaiveDate::parse_from_str(end, "%Y-%m-%d")?);
        }
        if self.sync_all {
            config.sync_all = true;
        }
        Ok(())
    }
}

fn run_sync_cmd(
    stream: &str,
    config_path: Option<&Path>,
    output_dir: &Path,
    format: &str,
    state_flag: Option<PathBuf>,
    full_refresh: bool,
    overrides: Overrides,
) -> Result<()> {
    let Some(kind) = StreamKind::parse(stream) else {
        bail!("unknown stream '{stream}'. Run `vnfeed streams` for the catalog");
    };

    let mut config = load_config(config_path)?;
    overrides.apply(&mut config)?;

    // The connection check gates every sync; it never throws.
    let outcome = check_connection(&config, None);
    if !outcome.success {
        bail!("configuration rejected: {}", outcome.message);
    }

    let today = chrono::Local::now().date_naive();
    let mut job = build_stream(kind, &config, today)?;

    // Restore persisted cursor state unless a full refresh was requested.
    // The --state flag wins over the config's state_path.
    let state_path = state_flag
        .or_else(|| config.state_path.clone())
        .unwrap_or_else(|| PathBuf::from("state.json"));
    let store = StateStore::new(state_path);
    if !full_refresh {
        if let JobKind::Incremental { tracker, .. } = &mut job.kind {
            if let Some(cursor) = store.cursor_for(kind.name())? {
                tracker.restore(cursor);
            }
        }
    }

    let mut sink: Box<dyn RecordSink> = match format {
        "jsonl" => Box::new(JsonlSink::open(
            &output_dir.join(format!("{}.jsonl", kind.name())),
        )?),
        "csv" => Box::new(CsvSink::new(
            output_dir.join(format!("{}.csv", kind.name())),
        )),
        other => bail!("unknown format '{other}'. Valid: jsonl, csv"),
    };

    let transport = HttpTransport::from_config(&config);
    let cancel = CancelToken::new();
    let report = run_sync(
        job,
        &transport,
        config.on_error,
        &cancel,
        &StdoutProgress,
        sink.as_mut(),
    );
    sink.finish()?;

    // Persist the cursor even on partial runs — resuming is safe because
    // markers only ever advance.
    if let Some(cursor) = &report.cursor {
        store.save_cursor(kind.name(), cursor)?;
    }

    println!();
    println!("=== Sync Report: {} ===", report.stream);
    println!("Tickers:         {}/{}", report.tickers_synced, report.tickers_total);
    println!("Records emitted: {}", report.records_emitted);
    if kind.is_incremental() {
        println!("Records stale:   {}", report.records_stale);
        println!("No marker:       {}", report.records_missing_marker);
    }
    if !report.skipped.is_empty() {
        println!("Skipped:");
        for skip in &report.skipped {
            println!("  {}: {}", skip.ticker, skip.error);
        }
    }
    if report.cancelled {
        println!("Sync was cancelled; cursor state saved for resume.");
    }

    if report.phase != SyncPhase::Completed {
        if let Some(failure) = &report.failure {
            eprintln!("Sync failed: {failure}");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run_state_status(state_path: &Path) -> Result<()> {
    let store = StateStore::new(state_path);
    let state = store.load()?;

    if state.is_empty() {
        println!("No persisted cursor state at {}", state_path.display());
        return Ok(());
    }

    for (stream, cursor) in &state {
        println!("{stream}: {} tickers tracked", cursor.len());
        for (ticker, marker) in cursor {
            println!("  {ticker:<10} {marker}");
        }
    }
    Ok(())
}

fn run_state_clear(state_path: &Path, confirm: bool) -> Result<()> {
    let store = StateStore::new(state_path);
    let state = store.load()?;

    if state.is_empty() {
        println!("Nothing to clear at {}", state_path.display());
        return Ok(());
    }

    println!(
        "State file {} tracks {} stream(s).",
        state_path.display(),
        state.len()
    );
    if !confirm {
        println!("Dry run — pass --confirm to actually delete.");
        return Ok(());
    }

    store.clear()?;
    println!("Cleared.");
    Ok(())
}
