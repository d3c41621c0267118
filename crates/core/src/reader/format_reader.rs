use std::sync::Arc;

use log::{debug, warn};

use super::csv_parser::{parse_csv, ParseConfig};
use super::raw_table::RawTable;
use super::workbook::read_worksheet;
use crate::adapters::{AdapterRegistry, BrokerAdapterConfig, SourceKind};
use crate::errors::{Error, Result};
use crate::spreadsheet_xml::{extract, sanitize_document, SpreadsheetNamespace, WorksheetConfig, WorksheetSpec};

/// Turns raw broker file bytes into a [`RawTable`], dispatching on the
/// adapter's source kind.
#[derive(Debug, Clone)]
pub struct FormatReader {
    registry: Arc<AdapterRegistry>,
}

impl FormatReader {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self { registry }
    }

    pub fn read(&self, broker_id: &str, content: &[u8]) -> Result<RawTable> {
        let adapter = self.registry.lookup(broker_id)?;
        read_raw_table(adapter, content)
    }
}

/// Reads a broker file with an already resolved adapter.
pub fn read_raw_table(adapter: &BrokerAdapterConfig, content: &[u8]) -> Result<RawTable> {
    let table = match adapter.source_kind {
        SourceKind::DelimitedText => read_delimited(adapter, content)?,
        SourceKind::BinarySpreadsheet => {
            let rows = read_worksheet(content, adapter.worksheet.as_deref(), adapter.header_skip_rows)?;
            split_header(rows, adapter)?
        }
        SourceKind::XmlSpreadsheet => read_xml_spreadsheet(adapter, content)?,
    };
    debug!(
        "Read {} rows with {} columns for broker '{}'",
        table.len(),
        table.headers.len(),
        adapter.broker_id
    );
    Ok(table)
}

fn read_delimited(adapter: &BrokerAdapterConfig, content: &[u8]) -> Result<RawTable> {
    let config = ParseConfig {
        delimiter: adapter.delimiter.clone(),
        skip_top_rows: Some(adapter.header_skip_rows),
    };
    let parsed = parse_csv(content, &config)?;
    for error in &parsed.errors {
        warn!(
            "[{}] {} issue in '{}' file: {}",
            adapter.broker_id, error.error_type, adapter.source_kind, error.message
        );
    }
    Ok(RawTable::from_strings(parsed.headers, parsed.rows))
}

fn read_xml_spreadsheet(adapter: &BrokerAdapterConfig, content: &[u8]) -> Result<RawTable> {
    let worksheet = adapter.worksheet.as_deref().ok_or_else(|| {
        Error::Configuration(format!(
            "Adapter '{}' reads spreadsheet XML but names no worksheet",
            adapter.broker_id
        ))
    })?;

    let document = sanitize_document(content);
    let config: WorksheetConfig = [(
        worksheet.to_string(),
        WorksheetSpec {
            row_start: adapter.header_skip_rows,
        },
    )]
    .into_iter()
    .collect();

    let mut tables = extract(&document, &config, &SpreadsheetNamespace::default())?;
    let rows = tables.remove(worksheet).unwrap_or_default();
    split_header(rows, adapter)
}

fn split_header(rows: Vec<Vec<Option<String>>>, adapter: &BrokerAdapterConfig) -> Result<RawTable> {
    RawTable::from_rows(rows).ok_or_else(|| {
        Error::unreadable(
            adapter.source_kind,
            format!(
                "no header row after skipping {} rows",
                adapter.header_skip_rows
            ),
        )
    })
}
