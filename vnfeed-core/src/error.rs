//! Structured error types for listing, fetching, and configuration.
//!
//! These are designed to be displayable in both CLI output and logs. The
//! scope rules are: configuration errors are caught by the connection check
//! before a sync starts; listing-level fetch errors abort the whole sync;
//! per-ticker fetch errors are skipped under the configured error policy.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors from listing and per-ticker fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("unexpected HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },
}

impl FetchError {
    /// Whether this error came from the transport layer (as opposed to a
    /// response that arrived but could not be understood).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::NetworkUnreachable(_)
                | FetchError::HttpStatus { .. }
                | FetchError::RateLimited { .. }
        )
    }
}

/// Configuration errors. All of these are surfaced by the connection check;
/// a sync never starts with an invalid configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("frequency must be one of Yearly, Quarterly, Both; got '{0}'")]
    UnknownFrequency(String),

    #[error(
        "no usable date range: set both start_date and end_date, or days_before, or enable sync_all"
    )]
    MissingDateRange,

    #[error("start_date {start} is after end_date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },

    #[error("days_before must be non-negative; got {0}")]
    NegativeLookback(i64),

    #[error("page_size must be between 1 and {max}; got {got}")]
    PageSizeOutOfRange { got: usize, max: usize },

    #[error("symbol_url is required for the intraday stream")]
    MissingSymbolUrl,

    #[error("read config file: {0}")]
    Io(String),

    #[error("parse config TOML: {0}")]
    Parse(String),
}
