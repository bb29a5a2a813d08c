//! Stream registry — the catalog of declared connector streams.
//!
//! Each stream pairs a parent lister with a child fetcher (or exposes the
//! listing itself) and declares whether it syncs incrementally. This is the
//! single place where configuration options are turned into wired-up jobs.

use chrono::NaiveDate;

use vnfeed_core::config::ConnectorConfig;
use vnfeed_core::connectors::{
    FinancialsFetcher, IntradayFetcher, OverviewFetcher, PriceHistoryFetcher, RatingFetcher,
    RatingKind, StatementKind,
};
use vnfeed_core::connectors::{intraday, price_history};
use vnfeed_core::cursor::CursorTracker;
use vnfeed_core::error::ConfigError;
use vnfeed_core::lister::{Lister, OrganizationLister, SymbolFileLister};
use vnfeed_core::record::Marker;

use crate::sync::{JobKind, SyncJob};

/// Every stream the suite can sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Organizations,
    OrganizationOverview,
    PriceHistory,
    Intraday,
    IncomeStatement,
    BalanceSheet,
    CashFlow,
    GeneralRating,
    ValuationRating,
    BusinessOperationRating,
    FinancialHealthRating,
    IndustryHealthRating,
}

impl StreamKind {
    pub const ALL: [StreamKind; 12] = [
        StreamKind::Organizations,
        StreamKind::OrganizationOverview,
        StreamKind::PriceHistory,
        StreamKind::Intraday,
        StreamKind::IncomeStatement,
        StreamKind::BalanceSheet,
        StreamKind::CashFlow,
        StreamKind::GeneralRating,
        StreamKind::ValuationRating,
        StreamKind::BusinessOperationRating,
        StreamKind::FinancialHealthRating,
        StreamKind::IndustryHealthRating,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Organizations => "organizations",
            Self::OrganizationOverview => "organization_overview",
            Self::PriceHistory => "price_history",
            Self::Intraday => "intraday",
            Self::IncomeStatement => "income_statement",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlow => "cash_flow",
            Self::GeneralRating => "general_rating",
            Self::ValuationRating => "valuation_rating",
            Self::BusinessOperationRating => "business_operation_rating",
            Self::FinancialHealthRating => "financial_health_rating",
            Self::IndustryHealthRating => "industry_health_rating",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == s)
    }

    /// Whether the stream tracks a per-ticker cursor between runs.
    pub fn is_incremental(&self) -> bool {
        matches!(self, Self::PriceHistory | Self::Intraday)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Organizations => "listed organizations (SSI master listing)",
            Self::OrganizationOverview => "per-ticker company profile",
            Self::PriceHistory => "daily OHLCV bars, incremental by trading date",
            Self::Intraday => "tick-by-tick trade feed, incremental by sequence id",
            Self::IncomeStatement => "income statement rows",
            Self::BalanceSheet => "balance sheet rows",
            Self::CashFlow => "cash flow rows",
            Self::GeneralRating => "composite analyst rating",
            Self::ValuationRating => "valuation rating",
            Self::BusinessOperationRating => "business operation rating",
            Self::FinancialHealthRating => "financial health rating",
            Self::IndustryHealthRating => "industry health rating",
        }
    }
}

/// Wire up one stream against the configuration.
///
/// `today` anchors window resolution and the intraday weekend quirk, so
/// jobs built for tests are deterministic.
pub fn build_stream(
    kind: StreamKind,
    config: &ConnectorConfig,
    today: NaiveDate,
) -> Result<SyncJob, ConfigError> {
    let fast_cap = config.fast_cap();
    let org_lister = || Box::new(OrganizationLister::new(fast_cap)) as Box<dyn Lister>;

    let (lister, job_kind): (Box<dyn Lister>, JobKind) = match kind {
        StreamKind::Organizations => (org_lister(), JobKind::Listing),
        StreamKind::OrganizationOverview => (
            org_lister(),
            JobKind::FullRefresh {
                fetcher: Box::new(OverviewFetcher),
            },
        ),
        StreamKind::PriceHistory => {
            let window = config.sync_window(today)?;
            (
                org_lister(),
                JobKind::Incremental {
                    fetcher: Box::new(PriceHistoryFetcher::new(window)),
                    tracker: CursorTracker::new(price_history::CURSOR_FIELD),
                    seed: Marker::epoch_date(),
                },
            )
        }
        StreamKind::Intraday => {
            let url = config
                .symbol_url
                .clone()
                .ok_or(ConfigError::MissingSymbolUrl)?;
            (
                Box::new(SymbolFileLister::new(url, fast_cap)),
                JobKind::Incremental {
                    fetcher: Box::new(IntradayFetcher::new(config.page_size, today)),
                    tracker: CursorTracker::new(intraday::CURSOR_FIELD),
                    seed: Marker::seq_start(),
                },
            )
        }
        StreamKind::IncomeStatement
        | StreamKind::BalanceSheet
        | StreamKind::CashFlow => {
            let statement = match kind {
                StreamKind::IncomeStatement => StatementKind::IncomeStatement,
                StreamKind::BalanceSheet => StatementKind::BalanceSheet,
                _ => StatementKind::CashFlow,
            };
            (
                org_lister(),
                JobKind::FullRefresh {
                    fetcher: Box::new(FinancialsFetcher::new(
                        statement,
                        config.frequency()?,
                        config.all_data,
                    )),
                },
            )
        }
        StreamKind::GeneralRating
        | StreamKind::ValuationRating
        | StreamKind::BusinessOperationRating
        | StreamKind::FinancialHealthRating
        | StreamKind::IndustryHealthRating => {
            let rating = match kind {
                StreamKind::GeneralRating => RatingKind::General,
                StreamKind::ValuationRating => RatingKind::Valuation,
                StreamKind::BusinessOperationRating => RatingKind::BusinessOperation,
                StreamKind::FinancialHealthRating => RatingKind::FinancialHealth,
                _ => RatingKind::IndustryHealth,
            };
            (
                org_lister(),
                JobKind::FullRefresh {
                    fetcher: Box::new(RatingFetcher::new(rating)),
                },
            )
        }
    };

    Ok(SyncJob {
        stream: kind.name().to_string(),
        lister,
        kind: job_kind,
    })
}
