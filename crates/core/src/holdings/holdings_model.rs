use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::*;

/// A column of the canonical holdings schema.
///
/// Variant order is the output column order; `Price` is the trailing optional column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalColumn {
    FundIsin,
    SecurityIsin,
    Ticker,
    Name,
    Weight,
    Sector,
    Exchange,
    Country,
    Currency,
    Price,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 10] = [
        CanonicalColumn::FundIsin,
        CanonicalColumn::SecurityIsin,
        CanonicalColumn::Ticker,
        CanonicalColumn::Name,
        CanonicalColumn::Weight,
        CanonicalColumn::Sector,
        CanonicalColumn::Exchange,
        CanonicalColumn::Country,
        CanonicalColumn::Currency,
        CanonicalColumn::Price,
    ];

    /// Descriptive columns blanked out for placeholder security identifiers.
    pub const PLACEHOLDER_SUPPRESSED: [CanonicalColumn; 5] = [
        CanonicalColumn::Ticker,
        CanonicalColumn::Name,
        CanonicalColumn::Sector,
        CanonicalColumn::Country,
        CanonicalColumn::Currency,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CanonicalColumn::FundIsin => COLUMN_FUND_ISIN,
            CanonicalColumn::SecurityIsin => COLUMN_SECURITY_ISIN,
            CanonicalColumn::Ticker => COLUMN_TICKER,
            CanonicalColumn::Name => COLUMN_NAME,
            CanonicalColumn::Weight => COLUMN_WEIGHT,
            CanonicalColumn::Sector => COLUMN_SECTOR,
            CanonicalColumn::Exchange => COLUMN_EXCHANGE,
            CanonicalColumn::Country => COLUMN_COUNTRY,
            CanonicalColumn::Currency => COLUMN_CURRENCY,
            CanonicalColumn::Price => COLUMN_PRICE,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Whether the column holds a decimal rather than free text.
    pub fn is_numeric(&self) -> bool {
        matches!(self, CanonicalColumn::Weight | CanonicalColumn::Price)
    }
}

/// One security's weight within one fund snapshot, as produced by the harmonizer.
///
/// `weight` stays `None` when the source cell was blank or unparseable; the
/// aggregator drops such rows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalHoldingsRow {
    pub fund_isin: String,
    pub security_isin: Option<String>,
    pub ticker: Option<String>,
    pub name: Option<String>,
    pub weight: Option<Decimal>,
    pub price: Option<Decimal>,
    pub sector: Option<String>,
    pub exchange: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    /// Values of columns whose label is outside the canonical schema.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl CanonicalHoldingsRow {
    pub fn new(fund_isin: impl Into<String>) -> Self {
        Self {
            fund_isin: fund_isin.into(),
            ..Default::default()
        }
    }

    /// Sets the text value of a non-numeric column. Numeric columns are ignored.
    pub fn set_text(&mut self, column: CanonicalColumn, value: Option<String>) {
        match column {
            CanonicalColumn::FundIsin => {
                if let Some(v) = value {
                    self.fund_isin = v;
                }
            }
            CanonicalColumn::SecurityIsin => self.security_isin = value,
            CanonicalColumn::Ticker => self.ticker = value,
            CanonicalColumn::Name => self.name = value,
            CanonicalColumn::Sector => self.sector = value,
            CanonicalColumn::Exchange => self.exchange = value,
            CanonicalColumn::Country => self.country = value,
            CanonicalColumn::Currency => self.currency = value,
            CanonicalColumn::Weight | CanonicalColumn::Price => {}
        }
    }
}

/// Harmonizer output: the column labels actually produced and the rows.
///
/// A column listed here may still be `None` on individual rows; a column
/// missing from `columns` was never supplied by the source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HarmonizedHoldings {
    pub columns: Vec<String>,
    pub rows: Vec<CanonicalHoldingsRow>,
}

impl HarmonizedHoldings {
    pub fn new(columns: Vec<String>, rows: Vec<CanonicalHoldingsRow>) -> Self {
        Self { columns, rows }
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.columns.iter().any(|c| c == label)
    }

    /// Canonical columns present in this set, in output order.
    pub fn canonical_columns(&self) -> BTreeSet<CanonicalColumn> {
        self.columns
            .iter()
            .filter_map(|c| CanonicalColumn::from_label(c))
            .collect()
    }

    /// Column labels outside the canonical schema.
    pub fn unrecognized_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| CanonicalColumn::from_label(c).is_none())
            .cloned()
            .collect()
    }

    /// Appends another fund's rows, taking the union of the column sets.
    pub fn merge(&mut self, other: HarmonizedHoldings) {
        for column in other.columns {
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self.rows.extend(other.rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One consolidated (fund, security) position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedHolding {
    pub fund_isin: String,
    pub security_isin: String,
    pub ticker: Option<String>,
    pub name: Option<String>,
    pub weight: Decimal,
    pub sector: Option<String>,
    pub exchange: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub price: Option<Decimal>,
}

impl AggregatedHolding {
    /// Renders a column value the way it is written to delimited output.
    pub fn value(&self, column: CanonicalColumn) -> Option<String> {
        match column {
            CanonicalColumn::FundIsin => Some(self.fund_isin.clone()),
            CanonicalColumn::SecurityIsin => Some(self.security_isin.clone()),
            CanonicalColumn::Ticker => self.ticker.clone(),
            CanonicalColumn::Name => self.name.clone(),
            CanonicalColumn::Weight => Some(self.weight.normalize().to_string()),
            CanonicalColumn::Sector => self.sector.clone(),
            CanonicalColumn::Exchange => self.exchange.clone(),
            CanonicalColumn::Country => self.country.clone(),
            CanonicalColumn::Currency => self.currency.clone(),
            CanonicalColumn::Price => self.price.map(|p| p.normalize().to_string()),
        }
    }

    pub(crate) fn clear(&mut self, column: CanonicalColumn) {
        match column {
            CanonicalColumn::Ticker => self.ticker = None,
            CanonicalColumn::Name => self.name = None,
            CanonicalColumn::Sector => self.sector = None,
            CanonicalColumn::Exchange => self.exchange = None,
            CanonicalColumn::Country => self.country = None,
            CanonicalColumn::Currency => self.currency = None,
            CanonicalColumn::Price => self.price = None,
            // Group keys and the summed weight are never cleared.
            CanonicalColumn::FundIsin | CanonicalColumn::SecurityIsin | CanonicalColumn::Weight => {}
        }
    }
}

/// Final output: one row per unique (fund ISIN, security ISIN).
///
/// `columns` lists the canonical columns present in the input, in output
/// order; columns the source never supplied are omitted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedHoldingsTable {
    pub columns: Vec<CanonicalColumn>,
    pub rows: Vec<AggregatedHolding>,
}

impl AggregatedHoldingsTable {
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.label()).collect()
    }

    /// String records aligned with [`headers`](Self::headers); missing values render empty.
    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| row.value(*c).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    pub fn get(&self, fund_isin: &str, security_isin: &str) -> Option<&AggregatedHolding> {
        self.rows
            .iter()
            .find(|r| r.fund_isin == fund_isin && r.security_isin == security_isin)
    }

    pub fn total_weight(&self) -> Decimal {
        self.rows.iter().map(|r| r.weight).sum()
    }

    /// Concatenates several tables; the column set is the union in output order.
    pub fn concat<'a>(tables: impl IntoIterator<Item = &'a AggregatedHoldingsTable>) -> Self {
        let mut columns = BTreeSet::new();
        let mut rows = Vec::new();
        for table in tables {
            columns.extend(table.columns.iter().copied());
            rows.extend(table.rows.iter().cloned());
        }
        Self {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
