//! Cleaning and consolidation of harmonized holdings.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::holdings_model::{
    AggregatedHolding, AggregatedHoldingsTable, CanonicalColumn, CanonicalHoldingsRow,
    HarmonizedHoldings,
};
use crate::constants::{DEFAULT_PLACEHOLDER_SECURITY_ISIN, REQUIRED_COLUMNS};
use crate::errors::{Error, Result};

/// Settings for [`clean_and_aggregate`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregationConfig {
    /// Security identifier marking cash and other non-security buckets.
    pub placeholder_security_isin: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            placeholder_security_isin: DEFAULT_PLACEHOLDER_SECURITY_ISIN.to_string(),
        }
    }
}

/// What the cleaner observed while aggregating.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AggregationReport {
    pub input_rows: usize,
    pub dropped_missing_weight: usize,
    pub dropped_missing_security: usize,
    /// Column labels outside the canonical schema; ignored by aggregation.
    pub unrecognized_columns: Vec<String>,
    /// Required columns absent from the input (at least one was present).
    pub missing_required_columns: Vec<String>,
}

impl AggregationReport {
    pub fn has_warnings(&self) -> bool {
        !self.unrecognized_columns.is_empty() || !self.missing_required_columns.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub table: AggregatedHoldingsTable,
    pub report: AggregationReport,
}

/// Validates harmonized rows and consolidates them to one row per
/// (fund ISIN, security ISIN).
///
/// Weights are summed; descriptive fields take the first non-missing value
/// in input order. Rows whose security is the placeholder lose their ticker,
/// name, sector, country and currency. Groups are emitted in ascending key
/// order, so the output does not depend on input order beyond which
/// descriptive value is seen first.
///
/// Fails with [`Error::SchemaViolation`] when none of the required columns
/// is present.
pub fn clean_and_aggregate(
    holdings: HarmonizedHoldings,
    config: &AggregationConfig,
) -> Result<AggregationResult> {
    let missing_required: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !holdings.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if missing_required.len() == REQUIRED_COLUMNS.len() {
        return Err(Error::SchemaViolation {
            required: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            found: holdings.columns.clone(),
        });
    }
    if !missing_required.is_empty() {
        warn!("Required column(s) {:?} missing from harmonized holdings", missing_required);
    }

    let unrecognized = holdings.unrecognized_columns();
    if !unrecognized.is_empty() {
        warn!("Not recognized column(s) {:?} ignored", unrecognized);
    }

    let present: BTreeSet<CanonicalColumn> = holdings.canonical_columns();
    let mut report = AggregationReport {
        input_rows: holdings.rows.len(),
        unrecognized_columns: unrecognized,
        missing_required_columns: missing_required,
        ..Default::default()
    };

    let mut groups: BTreeMap<(String, String), AggregatedHolding> = BTreeMap::new();
    for row in holdings.rows {
        let Some(weight) = row.weight else {
            report.dropped_missing_weight += 1;
            continue;
        };
        let security_isin = match row.security_isin.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => {
                report.dropped_missing_security += 1;
                continue;
            }
        };

        match groups.entry((row.fund_isin.clone(), security_isin)) {
            Entry::Vacant(slot) => {
                let mut holding = start_group(slot.key(), weight, row);
                for column in CanonicalColumn::ALL {
                    if !present.contains(&column) {
                        holding.clear(column);
                    }
                }
                slot.insert(holding);
            }
            Entry::Occupied(mut slot) => {
                let holding = slot.get_mut();
                holding.weight += weight;
                fill_missing(holding, row, &present);
            }
        }
    }

    if report.dropped_missing_weight > 0 {
        warn!("Dropped {} rows without weight", report.dropped_missing_weight);
    }
    if report.dropped_missing_security > 0 {
        warn!(
            "Dropped {} weighted rows without security identifier",
            report.dropped_missing_security
        );
    }

    let mut rows: Vec<AggregatedHolding> = groups.into_values().collect();
    for holding in rows
        .iter_mut()
        .filter(|h| h.security_isin == config.placeholder_security_isin)
    {
        for column in CanonicalColumn::PLACEHOLDER_SUPPRESSED {
            holding.clear(column);
        }
    }

    debug!(
        "Aggregated {} input rows into {} holdings",
        report.input_rows,
        rows.len()
    );

    Ok(AggregationResult {
        table: AggregatedHoldingsTable {
            columns: present.into_iter().collect(),
            rows,
        },
        report,
    })
}

fn start_group(
    key: &(String, String),
    weight: rust_decimal::Decimal,
    row: CanonicalHoldingsRow,
) -> AggregatedHolding {
    AggregatedHolding {
        fund_isin: key.0.clone(),
        security_isin: key.1.clone(),
        ticker: row.ticker,
        name: row.name,
        weight,
        sector: row.sector,
        exchange: row.exchange,
        country: row.country,
        currency: row.currency,
        price: row.price,
    }
}

fn fill_missing(
    holding: &mut AggregatedHolding,
    row: CanonicalHoldingsRow,
    present: &BTreeSet<CanonicalColumn>,
) {
    fn fill<T>(slot: &mut Option<T>, value: Option<T>, present: bool) {
        if present && slot.is_none() {
            *slot = value;
        }
    }
    fill(&mut holding.ticker, row.ticker, present.contains(&CanonicalColumn::Ticker));
    fill(&mut holding.name, row.name, present.contains(&CanonicalColumn::Name));
    fill(&mut holding.sector, row.sector, present.contains(&CanonicalColumn::Sector));
    fill(&mut holding.exchange, row.exchange, present.contains(&CanonicalColumn::Exchange));
    fill(&mut holding.country, row.country, present.contains(&CanonicalColumn::Country));
    fill(&mut holding.currency, row.currency, present.contains(&CanonicalColumn::Currency));
    fill(&mut holding.price, row.price, present.contains(&CanonicalColumn::Price));
}
