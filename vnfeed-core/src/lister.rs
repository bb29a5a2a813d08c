//! Parent listers — produce the identifier universe a sync fans out over.
//!
//! Two shapes exist upstream: the SSI FiinTrade organization listing (JSON
//! object with an `items` array) and a plain-text comma-separated symbol
//! file hosted at a configured URL. Neither endpoint paginates; the full
//! set arrives in one call.

use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;
use crate::record::Record;
use crate::transport::{HeaderSet, Transport};

/// The SSI FiinTrade organization-listing endpoint.
pub const ORGANIZATION_LIST_URL: &str =
    "https://fiin-core.ssi.com.vn/Master/GetListOrganization?language=vi";

/// A parent stream: one GET producing the tickers to fan out over.
pub trait Lister: Send + Sync {
    /// Human-readable name of this lister.
    fn name(&self) -> &str;

    /// Fetch the identifier list, fast-mode truncation applied.
    fn list(&self, transport: &dyn Transport) -> Result<Vec<String>, FetchError>;

    /// Full listing rows as flat records, for connectors that expose the
    /// listing itself as a stream. Default: one ticker-only record each.
    fn list_records(&self, transport: &dyn Transport) -> Result<Vec<Record>, FetchError> {
        Ok(self
            .list(transport)?
            .iter()
            .map(|t| Record::from_ticker(t))
            .collect())
    }
}

fn apply_fast_cap(mut items: Vec<String>, cap: Option<usize>) -> Vec<String> {
    if let Some(cap) = cap {
        items.truncate(cap);
    }
    items
}

// ── Organization listing ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OrganizationList {
    items: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Lists organizations from the SSI FiinTrade master endpoint.
pub struct OrganizationLister {
    fast_cap: Option<usize>,
}

impl OrganizationLister {
    pub fn new(fast_cap: Option<usize>) -> Self {
        Self { fast_cap }
    }

    fn fetch_items(
        &self,
        transport: &dyn Transport,
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, FetchError> {
        let body = transport.get(ORGANIZATION_LIST_URL, HeaderSet::Fiin)?;
        let parsed: OrganizationList = serde_json::from_str(&body).map_err(|e| {
            FetchError::ResponseFormatChanged(format!("organization listing: {e}"))
        })?;
        let mut items = parsed.items;
        if let Some(cap) = self.fast_cap {
            items.truncate(cap);
        }
        debug!(count = items.len(), "organization listing fetched");
        Ok(items)
    }
}

impl Lister for OrganizationLister {
    fn name(&self) -> &str {
        "organizations"
    }

    fn list(&self, transport: &dyn Transport) -> Result<Vec<String>, FetchError> {
        let mut tickers = Vec::new();
        for item in self.fetch_items(transport)? {
            let ticker = item
                .get("ticker")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| {
                    FetchError::ResponseFormatChanged(
                        "organization item without a ticker field".into(),
                    )
                })?;
            tickers.push(ticker.to_string());
        }
        Ok(tickers)
    }

    fn list_records(&self, transport: &dyn Transport) -> Result<Vec<Record>, FetchError> {
        let mut records = Vec::new();
        for item in self.fetch_items(transport)? {
            let ticker = item
                .get("ticker")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| {
                    FetchError::ResponseFormatChanged(
                        "organization item without a ticker field".into(),
                    )
                })?
                .to_string();
            records.push(Record::from_object(item, &ticker));
        }
        Ok(records)
    }
}

// ── Symbol file ──────────────────────────────────────────────────────

/// Lists symbols from a plain-text comma-separated file
/// (`"VVS,XDC,HSV,CST,..."`) hosted at a configured URL.
pub struct SymbolFileLister {
    url: String,
    fast_cap: Option<usize>,
}

impl SymbolFileLister {
    pub fn new(url: impl Into<String>, fast_cap: Option<usize>) -> Self {
        Self {
            url: url.into(),
            fast_cap,
        }
    }
}

impl Lister for SymbolFileLister {
    fn name(&self) -> &str {
        "symbol_file"
    }

    fn list(&self, transport: &dyn Transport) -> Result<Vec<String>, FetchError> {
        let body = transport.get(&self.url, HeaderSet::None)?;
        let symbols: Vec<String> = body
            .trim()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            return Err(FetchError::ResponseFormatChanged(format!(
                "symbol file at {} is empty or not comma-separated",
                self.url
            )));
        }
        debug!(count = symbols.len(), "symbol file fetched");
        Ok(apply_fast_cap(symbols, self.fast_cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Canned-response transport for tests.
    struct FakeTransport {
        responses: HashMap<String, String>,
    }

    impl FakeTransport {
        fn with(url: &str, body: &str) -> Self {
            let mut responses = HashMap::new();
            responses.insert(url.to_string(), body.to_string());
            Self { responses }
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str, _headers: HeaderSet) -> Result<String, FetchError> {
            self.responses.get(url).cloned().ok_or_else(|| {
                FetchError::HttpStatus {
                    status: 404,
                    url: url.to_string(),
                }
            })
        }
    }

    const ORG_BODY: &str = r#"{"items":[
        {"ticker":"TCB","organName":"Techcombank"},
        {"ticker":"VVS","organName":"Vinam"},
        {"ticker":"XDC","organName":"XD Construction"}
    ]}"#;

    #[test]
    fn organization_lister_extracts_tickers() {
        let transport = FakeTransport::with(ORGANIZATION_LIST_URL, ORG_BODY);
        let lister = OrganizationLister::new(None);
        assert_eq!(lister.list(&transport).unwrap(), vec!["TCB", "VVS", "XDC"]);
    }

    #[test]
    fn organization_records_keep_the_full_row() {
        let transport = FakeTransport::with(ORGANIZATION_LIST_URL, ORG_BODY);
        let lister = OrganizationLister::new(None);
        let records = lister.list_records(&transport).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].ticker(), "TCB");
        assert_eq!(
            records[0].get("organName").and_then(|v| v.as_str()),
            Some("Techcombank")
        );
    }

    #[test]
    fn fast_mode_keeps_the_first_n() {
        let transport = FakeTransport::with(ORGANIZATION_LIST_URL, ORG_BODY);
        let lister = OrganizationLister::new(Some(2));
        assert_eq!(lister.list(&transport).unwrap(), vec!["TCB", "VVS"]);
    }

    #[test]
    fn organization_lister_reports_bad_shape() {
        let transport = FakeTransport::with(ORGANIZATION_LIST_URL, r#"{"rows":[]}"#);
        let lister = OrganizationLister::new(None);
        assert!(matches!(
            lister.list(&transport),
            Err(FetchError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn symbol_file_lister_splits_tokens() {
        let transport = FakeTransport::with("https://bucket/symbols.txt", "VVS,XDC,HSV,CST");
        let lister = SymbolFileLister::new("https://bucket/symbols.txt", None);
        assert_eq!(
            lister.list(&transport).unwrap(),
            vec!["VVS", "XDC", "HSV", "CST"]
        );
    }

    #[test]
    fn symbol_file_fast_mode_cap() {
        let transport =
            FakeTransport::with("https://bucket/symbols.txt", "VVS,XDC,HSV,CST,BVL,SGI,TOS");
        let lister = SymbolFileLister::new("https://bucket/symbols.txt", Some(5));
        assert_eq!(lister.list(&transport).unwrap().len(), 5);
        // deterministic prefix
        assert_eq!(
            lister.list(&transport).unwrap(),
            vec!["VVS", "XDC", "HSV", "CST", "BVL"]
        );
    }

    #[test]
    fn empty_symbol_file_is_a_format_error() {
        let transport = FakeTransport::with("https://bucket/symbols.txt", "   ");
        let lister = SymbolFileLister::new("https://bucket/symbols.txt", None);
        assert!(matches!(
            lister.list(&transport),
            Err(FetchError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn listing_transport_failure_propagates() {
        let transport = FakeTransport {
            responses: HashMap::new(),
        };
        let lister = OrganizationLister::new(None);
        assert!(matches!(
            lister.list(&transport),
            Err(FetchError::HttpStatus { status: 404, .. })
        ));
    }

    #[test]
    fn default_list_records_are_ticker_only() {
        let transport = FakeTransport::with("https://bucket/symbols.txt", "VVS,XDC");
        let lister = SymbolFileLister::new("https://bucket/symbols.txt", None);
        let records = lister.list_records(&transport).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].ticker(), "XDC");
    }
}
