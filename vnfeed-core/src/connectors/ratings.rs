//! Analyst-rating connectors over the TCBS rating endpoint.
//!
//! One endpoint family serves five rating dimensions. Each returns a single
//! JSON object per ticker. The general rating embeds a `stockRecommend`
//! sub-object that is not flat and not part of the stream; it is dropped.

use crate::error::FetchError;
use crate::record::Record;
use crate::transport::{HeaderSet, Transport};

use super::{parse_object_record, Fetcher, TCBS_ANALYSIS_BASE};

/// Rating dimensions exposed by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingKind {
    General,
    Valuation,
    BusinessOperation,
    FinancialHealth,
    IndustryHealth,
}

impl RatingKind {
    fn path_segment(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Valuation => "valuation",
            Self::BusinessOperation => "business-operation",
            Self::FinancialHealth => "financial-health",
            Self::IndustryHealth => "industry-health",
        }
    }

    pub fn stream_name(&self) -> &'static str {
        match self {
            Self::General => "general_rating",
            Self::Valuation => "valuation_rating",
            Self::BusinessOperation => "business_operation_rating",
            Self::FinancialHealth => "financial_health_rating",
            Self::IndustryHealth => "industry_health_rating",
        }
    }
}

fn rating_url(kind: RatingKind, ticker: &str) -> String {
    format!(
        "{TCBS_ANALYSIS_BASE}/rating/{ticker}/{}?fType=TICKER",
        kind.path_segment()
    )
}

/// Fetches one rating dimension for one ticker.
pub struct RatingFetcher {
    kind: RatingKind,
}

impl RatingFetcher {
    pub fn new(kind: RatingKind) -> Self {
        Self { kind }
    }
}

impl Fetcher for RatingFetcher {
    fn name(&self) -> &str {
        self.kind.stream_name()
    }

    fn fetch(
        &self,
        transport: &dyn Transport,
        ticker: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let url = rating_url(self.kind, ticker);
        let body = transport.get(&url, HeaderSet::None)?;
        let mut record = parse_object_record(&body, ticker, self.kind.stream_name())?;
        if self.kind == RatingKind::General {
            record.remove("stockRecommend");
        }
        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::FakeTransport;
    use super::*;

    #[test]
    fn url_shape_per_dimension() {
        assert_eq!(
            rating_url(RatingKind::General, "TCB"),
            "https://apipubaws.tcbs.com.vn/tcanalysis/v1/rating/TCB/general?fType=TICKER"
        );
        assert_eq!(
            rating_url(RatingKind::BusinessOperation, "VVS"),
            "https://apipubaws.tcbs.com.vn/tcanalysis/v1/rating/VVS/business-operation?fType=TICKER"
        );
    }

    #[test]
    fn general_rating_drops_stock_recommend() {
        let mut transport = FakeTransport::new();
        transport.insert(
            &rating_url(RatingKind::General, "TCB"),
            r#"{"rating":4,"valuation":3,"stockRecommend":{"buy":12,"hold":3}}"#,
        );

        let records = RatingFetcher::new(RatingKind::General)
            .fetch(&transport, "TCB")
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("rating"), Some(&serde_json::json!(4)));
        assert_eq!(records[0].get("stockRecommend"), None);
    }

    #[test]
    fn other_dimensions_keep_their_fields() {
        let mut transport = FakeTransport::new();
        transport.insert(
            &rating_url(RatingKind::Valuation, "TCB"),
            r#"{"pe":3,"pb":4,"stockRecommend":5}"#,
        );

        let records = RatingFetcher::new(RatingKind::Valuation)
            .fetch(&transport, "TCB")
            .unwrap();
        // only the general rating filters the field
        assert_eq!(records[0].get("stockRecommend"), Some(&serde_json::json!(5)));
    }

    #[test]
    fn non_object_body_is_a_format_error() {
        let mut transport = FakeTransport::new();
        transport.insert(&rating_url(RatingKind::FinancialHealth, "TCB"), "[1,2,3]");

        assert!(matches!(
            RatingFetcher::new(RatingKind::FinancialHealth).fetch(&transport, "TCB"),
            Err(FetchError::ResponseFormatChanged(_))
        ));
    }
}
