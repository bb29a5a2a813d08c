//! Connector configuration and sync-window resolution.
//!
//! Options are read from a TOML file into `ConnectorConfig`, validated up
//! front (the connection check reports the first violation), and resolved
//! into a concrete `SyncWindow` relative to "today" so that window math is
//! deterministic under test.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Largest accepted intraday page size.
pub const MAX_PAGE_SIZE: usize = 100;

/// Reporting frequency for financial-statement streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Yearly,
    Quarterly,
    Both,
}

impl Frequency {
    /// Parse a user-supplied frequency string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "Yearly" => Ok(Self::Yearly),
            "Quarterly" => Ok(Self::Quarterly),
            "Both" => Ok(Self::Both),
            other => Err(ConfigError::UnknownFrequency(other.to_string())),
        }
    }
}

/// What to do when a per-ticker fetch fails mid-sync.
///
/// This is an explicit choice, not a silent default: the sync report always
/// carries the skipped tickers, and `Abort` stops at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure, record the ticker as skipped, continue with the rest.
    SkipTicker,
    /// Stop the sync on the first per-ticker failure.
    Abort,
}

/// All recognized connector options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectorConfig {
    /// Truncate the identifier list for cheap test runs.
    pub fast_mode: bool,
    /// How many identifiers fast mode keeps (deterministic prefix).
    pub fast_mode_cap: usize,
    /// Lookback window in days, an alternative to an explicit range.
    pub days_before: Option<i64>,
    /// Explicit range start (ISO date).
    pub start_date: Option<NaiveDate>,
    /// Explicit range end (ISO date).
    pub end_date: Option<NaiveDate>,
    /// Fetch full history, ignoring any configured range.
    pub sync_all: bool,
    /// Yearly | Quarterly | Both, for financial-statement streams.
    pub frequency: String,
    /// Ask statement endpoints for their full archive (`isAll=true`).
    pub all_data: bool,
    /// Plain-text comma-separated symbol list endpoint (intraday parent).
    pub symbol_url: Option<String>,
    /// Intraday page size (1..=100).
    pub page_size: usize,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Courtesy pause between consecutive requests to the same host.
    pub request_pause_ms: u64,
    /// Extra attempts after a failed request. 0 keeps the at-most-one-attempt
    /// baseline; retry is an externally configured policy, never implicit.
    pub max_retries: u32,
    /// Per-ticker failure policy.
    pub on_error: ErrorPolicy,
    /// Where incremental streams persist their cursor state.
    pub state_path: Option<PathBuf>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            fast_mode: false,
            fast_mode_cap: 10,
            days_before: None,
            start_date: None,
            end_date: None,
            sync_all: false,
            frequency: "Quarterly".to_string(),
            all_data: false,
            symbol_url: None,
            page_size: 100,
            request_timeout_secs: 30,
            request_pause_ms: 200,
            max_retries: 0,
            on_error: ErrorPolicy::SkipTicker,
            state_path: None,
        }
    }
}

impl ConnectorConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate every recognized option. Returns the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Frequency::parse(&self.frequency)?;

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::PageSizeOutOfRange {
                got: self.page_size,
                max: MAX_PAGE_SIZE,
            });
        }

        if let Some(days) = self.days_before {
            if days < 0 {
                return Err(ConfigError::NegativeLookback(days));
            }
        }

        if !self.sync_all {
            match (self.start_date, self.end_date) {
                (Some(start), Some(end)) => {
                    if start > end {
                        return Err(ConfigError::InvertedDateRange { start, end });
                    }
                }
                (None, None) if self.days_before.is_some() => {}
                _ => return Err(ConfigError::MissingDateRange),
            }
        }

        Ok(())
    }

    /// The parsed frequency. Call after `validate()`; an unrecognized value
    /// is reported as a `ConfigError` either way.
    pub fn frequency(&self) -> Result<Frequency, ConfigError> {
        Frequency::parse(&self.frequency)
    }

    /// Fast-mode truncation cap, if fast mode is on.
    pub fn fast_cap(&self) -> Option<usize> {
        self.fast_mode.then_some(self.fast_mode_cap)
    }

    /// Resolve the fetch window relative to `today`.
    ///
    /// Precedence: `sync_all`, then an explicit start/end pair, then the
    /// `days_before` lookback.
    pub fn sync_window(&self, today: NaiveDate) -> Result<SyncWindow, ConfigError> {
        if self.sync_all {
            return Ok(SyncWindow::FullHistory { until: today });
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ConfigError::InvertedDateRange { start, end });
            }
            return Ok(SyncWindow::Range { start, end });
        }
        match self.days_before {
            Some(days) if days >= 0 => Ok(SyncWindow::Range {
                start: today - Duration::days(days),
                end: today,
            }),
            Some(days) => Err(ConfigError::NegativeLookback(days)),
            None => Err(ConfigError::MissingDateRange),
        }
    }
}

/// Resolved fetch window for range-based endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncWindow {
    /// Everything the endpoint has (`from=0` on the wire).
    FullHistory { until: NaiveDate },
    /// Closed date range, both ends inclusive.
    Range { start: NaiveDate, end: NaiveDate },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_config_validates_with_lookback() {
        let config = ConnectorConfig {
            days_before: Some(7),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_frequency_is_rejected() {
        let config = ConnectorConfig {
            frequency: "Weekly".into(),
            days_before: Some(7),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownFrequency("Weekly".into()))
        );
    }

    #[test]
    fn missing_range_is_rejected_when_sync_all_off() {
        let config = ConnectorConfig::default();
        assert_eq!(config.validate(), Err(ConfigError::MissingDateRange));
    }

    #[test]
    fn half_open_range_is_rejected() {
        let config = ConnectorConfig {
            start_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingDateRange));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let config = ConnectorConfig {
            start_date: Some(date(2024, 2, 1)),
            end_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedDateRange { .. })
        ));
    }

    #[test]
    fn sync_all_needs_no_range() {
        let config = ConnectorConfig {
            sync_all: true,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.sync_window(date(2024, 6, 1)).unwrap(),
            SyncWindow::FullHistory {
                until: date(2024, 6, 1)
            }
        );
    }

    #[test]
    fn lookback_window_is_relative_to_today() {
        let config = ConnectorConfig {
            days_before: Some(7),
            ..Default::default()
        };
        let window = config.sync_window(date(2024, 6, 8)).unwrap();
        assert_eq!(
            window,
            SyncWindow::Range {
                start: date(2024, 6, 1),
                end: date(2024, 6, 8),
            }
        );
    }

    #[test]
    fn explicit_range_beats_lookback() {
        let config = ConnectorConfig {
            days_before: Some(7),
            start_date: Some(date(2024, 1, 1)),
            end_date: Some(date(2024, 3, 1)),
            ..Default::default()
        };
        assert_eq!(
            config.sync_window(date(2024, 6, 8)).unwrap(),
            SyncWindow::Range {
                start: date(2024, 1, 1),
                end: date(2024, 3, 1),
            }
        );
    }

    #[test]
    fn page_size_bounds() {
        let config = ConnectorConfig {
            page_size: 200,
            days_before: Some(1),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::PageSizeOutOfRange { got: 200, max: 100 })
        );
    }

    #[test]
    fn toml_roundtrip() {
        let toml_str = r#"
            fast_mode = true
            fast_mode_cap = 5
            days_before = 7
            frequency = "Both"
            all_data = true
            page_size = 50
            on_error = "abort"
            state_path = "cursors/state.json"
        "#;
        let config = ConnectorConfig::from_toml(toml_str).unwrap();
        assert!(config.fast_mode);
        assert_eq!(config.fast_cap(), Some(5));
        assert_eq!(config.frequency().unwrap(), Frequency::Both);
        assert_eq!(config.on_error, ErrorPolicy::Abort);
        assert_eq!(config.page_size, 50);
        assert_eq!(
            config.state_path.as_deref(),
            Some(Path::new("cursors/state.json"))
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            ConnectorConfig::from_toml("frequenzy = \"Yearly\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
