//! Maps a broker's raw table onto the canonical holdings schema.

use std::str::FromStr;

use log::{debug, warn};
use rust_decimal::Decimal;

use super::holdings_model::{CanonicalColumn, CanonicalHoldingsRow, HarmonizedHoldings};
use crate::adapters::{BrokerAdapterConfig, DecimalStyle};
use crate::constants::COLUMN_FUND_ISIN;
use crate::reader::RawTable;

/// Parses a numeric cell under the adapter's decimal style.
///
/// Comma style replaces every "," with "." first. Blank or unparseable
/// values yield `None`; scientific notation is accepted.
pub fn parse_decimal_cell(value: &str, style: DecimalStyle) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = match style {
        DecimalStyle::Comma => trimmed.replace(',', "."),
        DecimalStyle::Dot => trimmed.to_string(),
    };
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
}

/// Source column kept by the adapter, with its canonical label.
struct SelectedColumn {
    source_index: usize,
    label: String,
    column: Option<CanonicalColumn>,
}

/// Applies the adapter's rename/select/coerce rules and stamps `fund_isin`
/// on every row.
///
/// Only columns that are both rename targets and listed in the adapter's
/// canonical columns survive. Rows keep source order; a missing weight stays
/// `None` for the cleaner to drop.
pub fn harmonize(raw: RawTable, adapter: &BrokerAdapterConfig, fund_isin: &str) -> HarmonizedHoldings {
    let selected = select_columns(&raw.headers, adapter);

    let mut columns = vec![COLUMN_FUND_ISIN.to_string()];
    columns.extend(
        adapter
            .canonical_columns
            .iter()
            .filter(|label| selected.iter().any(|s| &s.label == *label))
            .cloned(),
    );

    let mut unparseable = 0usize;
    let rows: Vec<CanonicalHoldingsRow> = raw
        .rows
        .into_iter()
        .map(|cells| {
            let mut row = CanonicalHoldingsRow::new(fund_isin);
            for selection in &selected {
                let value = cells
                    .get(selection.source_index)
                    .and_then(|c| c.as_deref())
                    .map(str::trim)
                    .filter(|v| !v.is_empty());

                match selection.column {
                    Some(column) if column.is_numeric() => {
                        let parsed = value.and_then(|v| parse_decimal_cell(v, adapter.decimal_style));
                        if let (Some(v), None) = (value, parsed) {
                            debug!("Unparseable {} '{}' treated as missing", selection.label, v);
                            unparseable += 1;
                        }
                        match column {
                            CanonicalColumn::Weight => row.weight = parsed,
                            _ => row.price = parsed,
                        }
                    }
                    Some(column) => row.set_text(column, value.map(str::to_string)),
                    None => {
                        if let Some(v) = value {
                            row.extras.insert(selection.label.clone(), v.to_string());
                        }
                    }
                }
            }
            row
        })
        .collect();

    if unparseable > 0 {
        warn!(
            "[{}] {} numeric cells for fund {} could not be parsed and were left missing",
            adapter.broker_id, unparseable, fund_isin
        );
    }
    debug!(
        "[{}] Harmonized {} rows for fund {} with columns {:?}",
        adapter.broker_id,
        rows.len(),
        fund_isin,
        columns
    );

    HarmonizedHoldings::new(columns, rows)
}

fn select_columns(headers: &[String], adapter: &BrokerAdapterConfig) -> Vec<SelectedColumn> {
    let mut selected: Vec<SelectedColumn> = Vec::new();
    for (source_index, header) in headers.iter().enumerate() {
        let Some(label) = adapter.rename(header) else {
            continue;
        };
        if label == COLUMN_FUND_ISIN {
            warn!(
                "[{}] Source column '{}' maps to {} which is stamped from the request; ignored",
                adapter.broker_id, header, COLUMN_FUND_ISIN
            );
            continue;
        }
        if !adapter.expects_column(label) {
            continue;
        }
        if selected.iter().any(|s| s.label == label) {
            warn!(
                "[{}] Source column '{}' duplicates target '{}'; first column kept",
                adapter.broker_id, header, label
            );
            continue;
        }
        selected.push(SelectedColumn {
            source_index,
            label: label.to_string(),
            column: CanonicalColumn::from_label(label),
        });
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SourceKind;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
            .collect()
    }

    fn ishares_adapter() -> BrokerAdapterConfig {
        BrokerAdapterConfig {
            broker_id: "iShares".to_string(),
            source_kind: SourceKind::DelimitedText,
            header_skip_rows: 2,
            column_rename_map: HashMap::from([
                ("ISIN".to_string(), "securityIsin".to_string()),
                ("Emittententicker".to_string(), "ticker".to_string()),
                ("Name".to_string(), "name".to_string()),
                ("Gewichtung (%)".to_string(), "weight".to_string()),
                ("Kurs".to_string(), "price".to_string()),
                ("Sektor".to_string(), "sector".to_string()),
            ]),
            canonical_columns: vec![
                "fundIsin".to_string(),
                "securityIsin".to_string(),
                "ticker".to_string(),
                "name".to_string(),
                "weight".to_string(),
                "sector".to_string(),
            ],
            decimal_style: DecimalStyle::Comma,
            delimiter: Some(",".to_string()),
            worksheet: None,
        }
    }

    #[test]
    fn test_parse_decimal_cell() {
        assert_eq!(parse_decimal_cell("12,5", DecimalStyle::Comma), Some(dec!(12.5)));
        assert_eq!(parse_decimal_cell("12.5", DecimalStyle::Comma), Some(dec!(12.5)));
        assert_eq!(parse_decimal_cell(" 30 ", DecimalStyle::Dot), Some(dec!(30)));
        assert_eq!(parse_decimal_cell("1.5e-3", DecimalStyle::Dot), Some(dec!(0.0015)));
        assert_eq!(parse_decimal_cell("-0,42", DecimalStyle::Comma), Some(dec!(-0.42)));
        assert_eq!(parse_decimal_cell("12,5", DecimalStyle::Dot), None);
        assert_eq!(parse_decimal_cell("-", DecimalStyle::Dot), None);
        assert_eq!(parse_decimal_cell("", DecimalStyle::Comma), None);
    }

    #[test]
    fn test_harmonize_renames_selects_and_stamps() {
        let raw = RawTable::new(
            vec![
                "Emittententicker".into(),
                "Name".into(),
                "Sektor".into(),
                "Anlageklasse".into(),
                "Gewichtung (%)".into(),
                "Kurs".into(),
                "ISIN".into(),
            ],
            vec![
                cells(&["SAP", "SAP SE", "IT", "Aktien", "10,25", "120,5", "DE0007164600"]),
                cells(&["EUR", "EUR CASH", "Cash", "Cash", "0,10", "", "-"]),
            ],
        );

        let result = harmonize(raw, &ishares_adapter(), "DE0005933931");

        // Kurs maps to price, which this adapter does not list as canonical.
        assert_eq!(
            result.columns,
            vec!["fundIsin", "securityIsin", "ticker", "name", "weight", "sector"]
        );
        assert_eq!(result.len(), 2);

        let sap = &result.rows[0];
        assert_eq!(sap.fund_isin, "DE0005933931");
        assert_eq!(sap.security_isin.as_deref(), Some("DE0007164600"));
        assert_eq!(sap.ticker.as_deref(), Some("SAP"));
        assert_eq!(sap.weight, Some(dec!(10.25)));
        assert_eq!(sap.price, None);
        assert!(sap.extras.is_empty());

        assert_eq!(result.rows[1].security_isin.as_deref(), Some("-"));
        assert_eq!(result.rows[1].weight, Some(dec!(0.10)));
    }

    #[test]
    fn test_missing_optional_column_is_tolerated() {
        let raw = RawTable::new(
            vec!["ISIN".into(), "Gewichtung (%)".into()],
            vec![cells(&["DE000A", "1,5"])],
        );
        let result = harmonize(raw, &ishares_adapter(), "LU1");
        assert_eq!(result.columns, vec!["fundIsin", "securityIsin", "weight"]);
        assert_eq!(result.rows[0].sector, None);
    }

    #[test]
    fn test_unparseable_weight_left_missing() {
        let raw = RawTable::new(
            vec!["ISIN".into(), "Gewichtung (%)".into()],
            vec![cells(&["DE000A", "n/a"]), cells(&["DE000B", ""]), cells(&["DE000C"])],
        );
        let result = harmonize(raw, &ishares_adapter(), "LU1");
        assert_eq!(result.len(), 3);
        assert!(result.rows.iter().all(|r| r.weight.is_none()));
    }

    #[test]
    fn test_duplicate_target_keeps_first_column() {
        let mut adapter = ishares_adapter();
        adapter
            .column_rename_map
            .insert("Name (lang)".to_string(), "name".to_string());
        let raw = RawTable::new(
            vec!["Name".into(), "Name (lang)".into(), "Gewichtung (%)".into()],
            vec![cells(&["Short", "Long name", "1"])],
        );
        let result = harmonize(raw, &adapter, "LU1");
        assert_eq!(result.rows[0].name.as_deref(), Some("Short"));
    }

    #[test]
    fn test_non_canonical_target_kept_as_extra() {
        let mut adapter = ishares_adapter();
        adapter
            .column_rename_map
            .insert("Datum".to_string(), "asOfDate".to_string());
        adapter.canonical_columns.push("asOfDate".to_string());
        let raw = RawTable::new(
            vec!["Datum".into(), "Gewichtung (%)".into()],
            vec![cells(&["17.10.2026", "1"])],
        );
        let result = harmonize(raw, &adapter, "LU1");
        assert_eq!(result.unrecognized_columns(), vec!["asOfDate"]);
        assert_eq!(
            result.rows[0].extras.get("asOfDate").map(String::as_str),
            Some("17.10.2026")
        );
    }

    #[test]
    fn test_empty_table_yields_empty_rows() {
        let raw = RawTable::new(vec!["ISIN".into(), "Gewichtung (%)".into()], vec![]);
        let result = harmonize(raw, &ishares_adapter(), "LU1");
        assert!(result.is_empty());
        assert_eq!(result.columns, vec!["fundIsin", "securityIsin", "weight"]);
    }
}
