//! End-to-end tests of binary workbook exports, built in memory as xlsx.

use std::collections::HashMap;
use std::sync::Arc;

use fundholdings_core::adapters::{BrokerAdapterConfig, DecimalStyle, SourceKind};
use fundholdings_core::holdings::CanonicalColumn;
use fundholdings_core::{AdapterRegistry, AggregationConfig, Error, FundRequest, HoldingsPipeline};
use rust_decimal_macros::dec;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

/// Writes a header row followed by (ISIN, name, weight, country) rows.
fn write_holdings_sheet(
    sheet: &mut Worksheet,
    header_row: u32,
    holdings: &[(&str, &str, f64, &str)],
) -> Result<(), XlsxError> {
    for (col, label) in ["ISIN", "Name", "Weighting", "Country"].iter().enumerate() {
        sheet.write_string(header_row, col as u16, *label)?;
    }
    for (i, (isin, name, weight, country)) in holdings.iter().enumerate() {
        let row = header_row + 1 + i as u32;
        sheet.write_string(row, 0, *isin)?;
        sheet.write_string(row, 1, *name)?;
        sheet.write_number(row, 2, *weight)?;
        sheet.write_string(row, 3, *country)?;
    }
    Ok(())
}

/// XTrackers layout: an empty first row, two preamble rows, header on row 4.
fn xtrackers_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(1, 0, "Xtrackers MSCI World UCITS ETF 1C").unwrap();
    sheet.write_string(2, 0, "Stand: 17.10.2026").unwrap();
    write_holdings_sheet(
        sheet,
        3,
        &[
            ("US0378331005", "APPLE INC", 30.0, "United States"),
            ("US5949181045", "MICROSOFT CORP", 12.25, "United States"),
            ("US0378331005", "APPLE INC", 5.5, "United States"),
        ],
    )
    .unwrap();
    workbook.save_to_buffer().unwrap()
}

/// Two sheets: a disclaimer first, the holdings on a sheet named "Holdings".
fn named_sheet_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    workbook
        .add_worksheet()
        .set_name("Disclaimer")
        .unwrap()
        .write_string(0, 0, "Not investment advice")
        .unwrap();
    let sheet = workbook.add_worksheet().set_name("Holdings").unwrap();
    write_holdings_sheet(sheet, 0, &[("DE0007164600", "SAP SE", 8.0, "Germany")]).unwrap();
    workbook.save_to_buffer().unwrap()
}

fn named_sheet_pipeline(worksheet: &str) -> HoldingsPipeline {
    let adapter = BrokerAdapterConfig {
        broker_id: "Sheets".to_string(),
        source_kind: SourceKind::BinarySpreadsheet,
        header_skip_rows: 0,
        column_rename_map: HashMap::from([
            ("ISIN".to_string(), "securityIsin".to_string()),
            ("Name".to_string(), "name".to_string()),
            ("Weighting".to_string(), "weight".to_string()),
        ]),
        canonical_columns: vec![
            "fundIsin".to_string(),
            "securityIsin".to_string(),
            "name".to_string(),
            "weight".to_string(),
        ],
        decimal_style: DecimalStyle::Dot,
        delimiter: None,
        worksheet: Some(worksheet.to_string()),
    };
    let registry = AdapterRegistry::from_configs(vec![adapter]).unwrap();
    HoldingsPipeline::new(Arc::new(registry), AggregationConfig::default())
}

#[test]
fn test_builtin_xtrackers_xlsx_export() {
    let pipeline = HoldingsPipeline::default();
    let request = FundRequest::new("XTrackers", "IE00BJ0KDQ92", "world.xlsx");

    let holdings = pipeline
        .process_fund(&request, &xtrackers_workbook())
        .unwrap();

    // The skip of three rows counts the empty first row of the sheet.
    assert_eq!(holdings.report.entries, 3);
    assert_eq!(
        holdings.table.headers(),
        vec!["fundIsin", "securityIsin", "name", "weight", "country"]
    );
    assert_eq!(holdings.table.len(), 2);

    let apple = holdings.table.get("IE00BJ0KDQ92", "US0378331005").unwrap();
    assert_eq!(apple.weight, dec!(35.5));
    assert_eq!(apple.name.as_deref(), Some("APPLE INC"));
    assert_eq!(apple.country.as_deref(), Some("United States"));
    assert_eq!(holdings.table.total_weight(), dec!(47.75));
}

#[test]
fn test_named_worksheet_is_selected() {
    let pipeline = named_sheet_pipeline("Holdings");

    let holdings = pipeline
        .process_fund(
            &FundRequest::new("Sheets", "LU0000000001", "fund.xlsx"),
            &named_sheet_workbook(),
        )
        .unwrap();

    assert_eq!(
        holdings.table.columns,
        vec![
            CanonicalColumn::FundIsin,
            CanonicalColumn::SecurityIsin,
            CanonicalColumn::Name,
            CanonicalColumn::Weight
        ]
    );
    let sap = holdings.table.get("LU0000000001", "DE0007164600").unwrap();
    assert_eq!(sap.weight, dec!(8));
    assert_eq!(sap.name.as_deref(), Some("SAP SE"));
}

#[test]
fn test_missing_named_worksheet_is_schema_mismatch() {
    let pipeline = named_sheet_pipeline("Positionen");

    let err = pipeline
        .process_fund(
            &FundRequest::new("Sheets", "LU0000000001", "fund.xlsx"),
            &named_sheet_workbook(),
        )
        .unwrap_err();

    assert!(matches!(err, Error::SchemaMismatch(_)));
}
