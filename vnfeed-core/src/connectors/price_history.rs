//! Daily price-history connector over the TCBS long-term bars endpoint.
//!
//! The endpoint takes the range as Unix timestamps. Full-history syncs ask
//! from timestamp 0; windowed syncs cover `[start 00:00:00, end 23:59:59]`
//! UTC so both boundary days are included. Bars carry their trading date
//! under `tradingDate`, which doubles as the incremental cursor field.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::SyncWindow;
use crate::error::FetchError;
use crate::record::Record;
use crate::transport::{HeaderSet, Transport};

use super::{Fetcher, TCBS_STOCK_INSIGHT_BASE};

/// Record field carrying the incremental cursor marker.
pub const CURSOR_FIELD: &str = "tradingDate";

#[derive(Debug, Deserialize)]
struct BarsResponse {
    ticker: String,
    data: Vec<Map<String, Value>>,
}

/// Convert the resolved window into the endpoint's `from`/`to` timestamps.
fn window_timestamps(window: SyncWindow) -> (i64, i64) {
    match window {
        SyncWindow::FullHistory { until } => (0, end_of_day(until)),
        SyncWindow::Range { start, end } => (start_of_day(start), end_of_day(end)),
    }
}

fn start_of_day(date: chrono::NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
}

fn end_of_day(date: chrono::NaiveDate) -> i64 {
    date.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp()
}

fn bars_url(ticker: &str, window: SyncWindow) -> String {
    let (from, to) = window_timestamps(window);
    format!(
        "{TCBS_STOCK_INSIGHT_BASE}/stock/bars-long-term\
         ?ticker={ticker}&type=stock&resolution=D&from={from}&to={to}"
    )
}

/// Fetches daily OHLCV bars for one ticker over the resolved window.
pub struct PriceHistoryFetcher {
    window: SyncWindow,
}

impl PriceHistoryFetcher {
    pub fn new(window: SyncWindow) -> Self {
        Self { window }
    }
}

impl Fetcher for PriceHistoryFetcher {
    fn name(&self) -> &str {
        "price_history"
    }

    fn cursor_field(&self) -> Option<&str> {
        Some(CURSOR_FIELD)
    }

    fn fetch(
        &self,
        transport: &dyn Transport,
        ticker: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let url = bars_url(ticker, self.window);
        let body = transport.get(&url, HeaderSet::None)?;
        let parsed: BarsResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::ResponseFormatChanged(format!("price history: {e}")))?;

        Ok(parsed
            .data
            .into_iter()
            .map(|bar| Record::from_object(bar, &parsed.ticker))
            .collect())
    }
}
