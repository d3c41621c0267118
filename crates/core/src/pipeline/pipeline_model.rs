use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::holdings::{AggregatedHoldingsTable, AggregationReport};

/// Control metadata for one fund export.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FundRequest {
    pub broker_id: String,
    pub fund_isin: String,
    pub location: String,
}

impl FundRequest {
    pub fn new(
        broker_id: impl Into<String>,
        fund_isin: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            broker_id: broker_id.into(),
            fund_isin: fund_isin.into(),
            location: location.into(),
        }
    }
}

/// Counts and warnings collected while processing one fund.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FundReport {
    pub broker_id: String,
    pub fund_isin: String,
    /// Body rows read from the export, after header skipping.
    pub entries: usize,
    pub harmonized_rows: usize,
    /// Consolidated (fund, security) rows in the output.
    pub holdings: usize,
    pub dropped_missing_weight: usize,
    pub dropped_missing_security: usize,
    pub unrecognized_columns: Vec<String>,
    pub missing_required_columns: Vec<String>,
}

impl FundReport {
    pub(crate) fn new(broker_id: &str, fund_isin: &str, entries: usize, aggregation: AggregationReport, holdings: usize) -> Self {
        Self {
            broker_id: broker_id.to_string(),
            fund_isin: fund_isin.to_string(),
            entries,
            harmonized_rows: aggregation.input_rows,
            holdings,
            dropped_missing_weight: aggregation.dropped_missing_weight,
            dropped_missing_security: aggregation.dropped_missing_security,
            unrecognized_columns: aggregation.unrecognized_columns,
            missing_required_columns: aggregation.missing_required_columns,
        }
    }
}

/// A successfully processed fund.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundHoldings {
    pub table: AggregatedHoldingsTable,
    pub report: FundReport,
}

/// Outcome of one request in a batch.
#[derive(Debug)]
pub struct FundResult {
    pub request: FundRequest,
    pub outcome: Result<FundHoldings>,
}

impl FundResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-fund results of a batch, in request order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<FundResult>,
}

impl BatchOutcome {
    pub fn successes(&self) -> impl Iterator<Item = &FundHoldings> {
        self.results.iter().filter_map(|r| r.outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FundResult> {
        self.results.iter().filter(|r| r.outcome.is_err())
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Concatenation of every successful fund's table, in request order.
    pub fn combined_table(&self) -> AggregatedHoldingsTable {
        AggregatedHoldingsTable::concat(self.successes().map(|h| &h.table))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
