//! Financial-statement connectors (income statement, balance sheet, cash
//! flow) over the TCBS finance endpoint.
//!
//! The endpoint serves all three statements under one path family with a
//! `yearly` flag (1 = yearly rows, 0 = quarterly rows) and an `isAll` flag
//! selecting the full archive. `Frequency::Both` issues the yearly request
//! first, then the quarterly one, and concatenates.

use crate::config::Frequency;
use crate::error::FetchError;
use crate::record::Record;
use crate::transport::{HeaderSet, Transport};

use super::{parse_array_records, Fetcher, TCBS_ANALYSIS_BASE};

/// Which financial statement a connector serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
}

impl StatementKind {
    fn path_segment(&self) -> &'static str {
        match self {
            Self::IncomeStatement => "incomestatement",
            Self::BalanceSheet => "balancesheet",
            Self::CashFlow => "cashflow",
        }
    }

    pub fn stream_name(&self) -> &'static str {
        match self {
            Self::IncomeStatement => "income_statement",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlow => "cash_flow",
        }
    }
}

fn statement_url(kind: StatementKind, ticker: &str, yearly: u8, all_data: bool) -> String {
    format!(
        "{TCBS_ANALYSIS_BASE}/finance/{ticker}/{}?yearly={yearly}&isAll={all_data}",
        kind.path_segment()
    )
}

/// Fetches statement rows for one ticker at the configured frequency.
pub struct FinancialsFetcher {
    kind: StatementKind,
    frequency: Frequency,
    all_data: bool,
}

impl FinancialsFetcher {
    pub fn new(kind: StatementKind, frequency: Frequency, all_data: bool) -> Self {
        Self {
            kind,
            frequency,
            all_data,
        }
    }

    /// `yearly` query values to request, in order.
    fn yearly_flags(&self) -> &'static [u8] {
        match self.frequency {
            Frequency::Yearly => &[1],
            Frequency::Quarterly => &[0],
            Frequency::Both => &[1, 0],
        }
    }
}

impl Fetcher for FinancialsFetcher {
    fn name(&self) -> &str {
        self.kind.stream_name()
    }

    fn fetch(
        &self,
        transport: &dyn Transport,
        ticker: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let mut records = Vec::new();
        for &yearly in self.yearly_flags() {
            let url = statement_url(self.kind, ticker, yearly, self.all_data);
            let body = transport.get(&url, HeaderSet::None)?;
            records.extend(parse_array_records(
                &body,
                ticker,
                self.kind.stream_name(),
            )?);
        }
        Ok(records)
    }
}
