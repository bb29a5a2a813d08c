//! Per-ticker fetch connectors.
//!
//! Each connector builds a detail URL for one ticker, issues the GET (or,
//! for the paginated intraday feed, one GET per page), and parses the
//! response into flat records stamped with the ticker.

pub mod financials;
pub mod intraday;
pub mod overview;
pub mod price_history;
pub mod ratings;

pub use financials::{FinancialsFetcher, StatementKind};
pub use intraday::IntradayFetcher;
pub use overview::OverviewFetcher;
pub use price_history::PriceHistoryFetcher;
pub use ratings::{RatingFetcher, RatingKind};

use crate::error::FetchError;
use crate::record::Record;
use crate::transport::Transport;

/// TCBS analysis API root (ratings, statements, overviews).
pub const TCBS_ANALYSIS_BASE: &str = "https://apipubaws.tcbs.com.vn/tcanalysis/v1";

/// TCBS stock-insight API root (bars, intraday feed).
pub const TCBS_STOCK_INSIGHT_BASE: &str = "https://apipubaws.tcbs.com.vn/stock-insight/v1";

/// A child stream: one or more detail requests per ticker, yielding zero or
/// more flat records.
pub trait Fetcher: Send + Sync {
    /// Human-readable name of this connector.
    fn name(&self) -> &str;

    /// Record field holding the incremental cursor marker, if this stream
    /// is incremental. Full-refresh streams return `None`.
    fn cursor_field(&self) -> Option<&str> {
        None
    }

    /// Fetch all records for `ticker`.
    fn fetch(&self, transport: &dyn Transport, ticker: &str)
        -> Result<Vec<Record>, FetchError>;
}

/// Parse a body that must be a single JSON object into one record.
pub(crate) fn parse_object_record(
    body: &str,
    ticker: &str,
    context: &str,
) -> Result<Record, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FetchError::ResponseFormatChanged(format!("{context}: {e}")))?;
    match value {
        serde_json::Value::Object(fields) => Ok(Record::from_object(fields, ticker)),
        other => Err(FetchError::ResponseFormatChanged(format!(
            "{context}: expected a JSON object, got {other}"
        ))),
    }
}

/// Parse a body that must be a JSON array of objects into records.
pub(crate) fn parse_array_records(
    body: &str,
    ticker: &str,
    context: &str,
) -> Result<Vec<Record>, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FetchError::ResponseFormatChanged(format!("{context}: {e}")))?;
    let rows = value.as_array().ok_or_else(|| {
        FetchError::ResponseFormatChanged(format!("{context}: expected a JSON array"))
    })?;
    rows.iter()
        .map(|row| match row {
            serde_json::Value::Object(fields) => {
                Ok(Record::from_object(fields.clone(), ticker))
            }
            other => Err(FetchError::ResponseFormatChanged(format!(
                "{context}: array element is not an object: {other}"
            ))),
        })
        .collect()
}
