use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::constants::COLUMN_WEIGHT;

/// How a broker publishes its holdings file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// Character-delimited text (csv, tsv).
    DelimitedText,
    /// Native xls/xlsx workbook.
    BinarySpreadsheet,
    /// Excel 2003 spreadsheet XML, usually served under an `.xls` name.
    XmlSpreadsheet,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::DelimitedText => "delimited-text",
            SourceKind::BinarySpreadsheet => "binary-spreadsheet",
            SourceKind::XmlSpreadsheet => "xml-spreadsheet",
        };
        f.write_str(s)
    }
}

/// Decimal separator used by a broker's numeric columns.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DecimalStyle {
    #[default]
    Dot,
    /// "," is the decimal separator and is rewritten to "." before parsing.
    Comma,
}

/// Declarative description of one broker's holdings export.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrokerAdapterConfig {
    pub broker_id: String,
    pub source_kind: SourceKind,
    /// Rows discarded before the header row.
    #[serde(default)]
    pub header_skip_rows: usize,
    /// Source column label -> canonical label. Unmapped source columns are dropped.
    pub column_rename_map: HashMap<String, String>,
    /// Canonical labels this broker is expected to supply, in output order.
    pub canonical_columns: Vec<String>,
    #[serde(default)]
    pub decimal_style: DecimalStyle,
    /// Field delimiter for delimited text; auto-detected when absent.
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Worksheet to read for spreadsheet kinds.
    #[serde(default)]
    pub worksheet: Option<String>,
}

impl BrokerAdapterConfig {
    /// Canonical label for a source column, if the adapter maps it.
    pub fn rename(&self, source_label: &str) -> Option<&str> {
        self.column_rename_map
            .get(source_label)
            .or_else(|| self.column_rename_map.get(source_label.trim()))
            .map(String::as_str)
    }

    pub fn expects_column(&self, canonical_label: &str) -> bool {
        self.canonical_columns.iter().any(|c| c == canonical_label)
    }

    /// Checks the adapter is usable by the format reader and harmonizer.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.broker_id.trim().is_empty() {
            return Err("Broker ID cannot be empty".to_string());
        }
        if !self.expects_column(COLUMN_WEIGHT) {
            return Err(format!(
                "Adapter '{}' does not supply the '{}' column",
                self.broker_id, COLUMN_WEIGHT
            ));
        }
        if let Some(delimiter) = &self.delimiter {
            if self.source_kind != SourceKind::DelimitedText {
                return Err(format!(
                    "Adapter '{}' sets a delimiter but reads {}",
                    self.broker_id, self.source_kind
                ));
            }
            let usable = matches!(delimiter.as_str(), "auto" | "\\t")
                || (delimiter.len() == 1 && delimiter.is_ascii());
            if !usable {
                return Err(format!(
                    "Adapter '{}' delimiter '{}' must be a single ASCII character",
                    self.broker_id, delimiter
                ));
            }
        }
        if self.source_kind == SourceKind::XmlSpreadsheet && self.worksheet.is_none() {
            return Err(format!(
                "Adapter '{}' reads spreadsheet XML but names no worksheet",
                self.broker_id
            ));
        }
        Ok(())
    }
}

/// Versioned list of adapters, the on-disk form of the registry.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdapterTable {
    pub version: u32,
    pub adapters: Vec<BrokerAdapterConfig>,
}
