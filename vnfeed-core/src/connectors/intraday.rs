//! Intraday trade-feed connector over the TCBS paginated his/paging endpoint.
//!
//! Pagination model: page 0 holds the NEWEST trades and each page is
//! newest-first internally. Total record count is learned from a probing
//! call with page size 1. The scan visits the highest page index first
//! (oldest data) and reverses each page, so the synthetic `id` sequence
//! assigned to records ascends across the whole scan — which is what the
//! cursor tracker needs to admit records in order. `id` is also the
//! incremental cursor field.
//!
//! On weekend days the endpoint wants an extra `headIndex=-1` parameter;
//! the request date is injected so the quirk stays deterministic in tests.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::FetchError;
use crate::record::Record;
use crate::transport::{HeaderSet, Transport};

use super::{Fetcher, TCBS_STOCK_INSIGHT_BASE};

/// Record field carrying the incremental cursor marker.
pub const CURSOR_FIELD: &str = "id";

#[derive(Debug, Deserialize)]
struct PagingResponse {
    ticker: String,
    data: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct PagingProbe {
    total: usize,
}

fn paging_url(symbol: &str, page: usize, size: usize, weekend: bool) -> String {
    let head_index = if weekend { "&headIndex=-1" } else { "" };
    format!(
        "{TCBS_STOCK_INSIGHT_BASE}/intraday/{symbol}/his/paging\
         ?page={page}&size={size}{head_index}"
    )
}

/// First id on `page`, with page 0 being the newest page.
fn base_index(total: usize, size: usize, page: usize) -> usize {
    total.saturating_sub(size * (page + 1))
}

/// Fetches the full intraday trade feed for one symbol, page by page.
pub struct IntradayFetcher {
    page_size: usize,
    /// Date the requests are issued on; drives the weekend URL quirk.
    on_date: NaiveDate,
}

impl IntradayFetcher {
    pub fn new(page_size: usize, on_date: NaiveDate) -> Self {
        Self { page_size, on_date }
    }

    fn is_weekend(&self) -> bool {
        matches!(self.on_date.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

impl Fetcher for IntradayFetcher {
    fn name(&self) -> &str {
        "intraday"
    }

    fn cursor_field(&self) -> Option<&str> {
        Some(CURSOR_FIELD)
    }

    fn fetch(
        &self,
        transport: &dyn Transport,
        ticker: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let weekend = self.is_weekend();

        // Probe with page size 1 to learn the total record count.
        let probe_body = transport.get(&paging_url(ticker, 0, 1, weekend), HeaderSet::None)?;
        let probe: PagingProbe = serde_json::from_str(&probe_body)
            .map_err(|e| FetchError::ResponseFormatChanged(format!("intraday probe: {e}")))?;

        if probe.total == 0 {
            return Ok(Vec::new());
        }

        let page_count = probe.total.div_ceil(self.page_size);
        debug!(ticker, total = probe.total, page_count, "intraday scan");

        let mut records = Vec::with_capacity(probe.total);
        for page in (0..page_count).rev() {
            let body = transport.get(
                &paging_url(ticker, page, self.page_size, weekend),
                HeaderSet::None,
            )?;
            let parsed: PagingResponse = serde_json::from_str(&body).map_err(|e| {
                FetchError::ResponseFormatChanged(format!("intraday page {page}: {e}"))
            })?;

            let base = base_index(probe.total, self.page_size, page);
            let mut rows = parsed.data;
            // The API returns newest-first within a page.
            rows.reverse();
            for (offset, row) in rows.into_iter().enumerate() {
                let mut record = Record::from_object(row, &parsed.ticker);
                record.set(CURSOR_FIELD, Value::from((base + offset) as i64));
                records.push(record);
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::FakeTransport;
    use super::*;

    fn weekday() -> NaiveDate {
        // A Wednesday.
        NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
    }

    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 8).unwrap()
    }

    fn page_body(ticker: &str, prices: &[f64]) -> String {
        let rows: Vec<String> = prices
            .iter()
            .map(|p| format!(r#"{{"p":{p},"v":100}}"#))
            .collect();
        format!(
            r#"{{"ticker":"{ticker}","page":0,"total":0,"data":[{}]}}"#,
            rows.join(",")
        )
    }

    #[test]
    fn weekend_url_carries_head_index() {
        assert!(paging_url("VVS", 0, 50, true).ends_with("&headIndex=-1"));
        assert!(!paging_url("VVS", 0, 50, false).contains("headIndex"));
    }

    #[test]
    fn base_index_covers_partial_deepest_page() {
        // 7 records, size 3 → pages: 0 = [4,5,6], 1 = [1,2,3], 2 = [0]
        assert_eq!(base_index(7, 3, 0), 4);
        assert_eq!(base_index(7, 3, 1), 1);
        assert_eq!(base_index(7, 3, 2), 0);
    }

    #[test]
    fn exact_multiple_has_no_phantom_page() {
        // 6 records, size 3 → exactly 2 pages, ids 0..=5
        assert_eq!(6usize.div_ceil(3), 2);
        assert_eq!(base_index(6, 3, 0), 3);
        assert_eq!(base_index(6, 3, 1), 0);
    }

    #[test]
    fn scan_assigns_ascending_ids_across_pages() {
        let mut transport = FakeTransport::new();
        // total = 5, size = 2 → 3 pages; page 2 is the single oldest trade.
        transport.insert(
            &paging_url("VVS", 0, 1, false),
            r#"{"ticker":"VVS","total":5,"data":[{"p":11.5}]}"#,
        );
        // page 2 (oldest): one record, newest-first within page is trivial
        transport.insert(&paging_url("VVS", 2, 2, false), &page_body("VVS", &[10.0]));
        // page 1: newest-first → 10.2 then 10.1
        transport.insert(
            &paging_url("VVS", 1, 2, false),
            &page_body("VVS", &[10.2, 10.1]),
        );
        // page 0 (newest): 10.4 then 10.3
        transport.insert(
            &paging_url("VVS", 0, 2, false),
            &page_body("VVS", &[10.4, 10.3]),
        );

        let fetcher = IntradayFetcher::new(2, weekday());
        let records = fetcher.fetch(&transport, "VVS").unwrap();

        let ids: Vec<i64> = records
            .iter()
            .map(|r| r.get("id").and_then(Value::as_i64).unwrap())
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);

        // Oldest trade first, newest last.
        let prices: Vec<f64> = records
            .iter()
            .map(|r| r.get("p").and_then(Value::as_f64).unwrap())
            .collect();
        assert_eq!(prices, vec![10.0, 10.1, 10.2, 10.3, 10.4]);
        assert!(records.iter().all(|r| r.ticker() == "VVS"));
    }

    #[test]
    fn zero_total_yields_no_records_and_no_page_fetches() {
        let mut transport = FakeTransport::new();
        transport.insert(
            &paging_url("XDC", 0, 1, false),
            r#"{"ticker":"XDC","total":0,"data":[]}"#,
        );

        let records = IntradayFetcher::new(2, weekday())
            .fetch(&transport, "XDC")
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn weekend_scan_probes_with_head_index() {
        let mut transport = FakeTransport::new();
        transport.insert(
            &paging_url("VVS", 0, 1, true),
            r#"{"ticker":"VVS","total":1,"data":[{"p":10.0}]}"#,
        );
        transport.insert(&paging_url("VVS", 0, 2, true), &page_body("VVS", &[10.0]));

        let records = IntradayFetcher::new(2, saturday())
            .fetch(&transport, "VVS")
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn probe_format_error_propagates() {
        let mut transport = FakeTransport::new();
        transport.insert(&paging_url("VVS", 0, 1, false), "not json");

        assert!(matches!(
            IntradayFetcher::new(2, weekday()).fetch(&transport, "VVS"),
            Err(FetchError::ResponseFormatChanged(_))
        ));
    }
}
