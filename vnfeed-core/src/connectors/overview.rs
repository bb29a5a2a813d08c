//! Organization overview connector — one profile object per ticker.

use crate::error::FetchError;
use crate::record::Record;
use crate::transport::{HeaderSet, Transport};

use super::{parse_object_record, Fetcher, TCBS_ANALYSIS_BASE};

fn overview_url(ticker: &str) -> String {
    format!("{TCBS_ANALYSIS_BASE}/ticker/{ticker}/overview")
}

/// Fetches the TCBS ticker overview (exchange, industry, share data).
pub struct OverviewFetcher;

impl Fetcher for OverviewFetcher {
    fn name(&self) -> &str {
        "organization_overview"
    }

    fn fetch(
        &self,
        transport: &dyn Transport,
        ticker: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let url = overview_url(ticker);
        let body = transport.get(&url, HeaderSet::None)?;
        let record = parse_object_record(&body, ticker, "ticker overview")?;
        Ok(vec![record])
    }
}
