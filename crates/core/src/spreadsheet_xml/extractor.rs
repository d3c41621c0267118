//! Tabular extraction from Excel 2003 spreadsheet XML.
//!
//! Walks Worksheet -> Table -> Row -> Cell -> Data and returns the raw cell
//! text of every configured worksheet. No column semantics live here.

use std::collections::HashMap;

use log::{debug, warn};
use roxmltree::{Document, Node, ParsingOptions};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_SPREADSHEET_COLUMNS, SPREADSHEET_XML_NAMESPACE, SPREADSHEET_XML_PREFIX};
use crate::errors::{Error, Result};

/// Rows of raw cells; `None` marks a cell without a `Data` child.
pub type CellRows = Vec<Vec<Option<String>>>;

/// Namespace qualifying the spreadsheet elements.
///
/// Elements are matched on the URI; the prefix is kept for diagnostics.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetNamespace {
    pub prefix: String,
    pub uri: String,
}

impl SpreadsheetNamespace {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }
}

impl Default for SpreadsheetNamespace {
    fn default() -> Self {
        Self::new(SPREADSHEET_XML_PREFIX, SPREADSHEET_XML_NAMESPACE)
    }
}

/// Extraction settings for one worksheet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetSpec {
    /// Rows before this index are skipped.
    pub row_start: usize,
}

/// Worksheet name -> extraction settings.
pub type WorksheetConfig = HashMap<String, WorksheetSpec>;

/// Extracts the configured worksheets of a spreadsheet XML document.
///
/// Worksheets absent from `config` are ignored. A configured worksheet that
/// the document lacks yields [`Error::SchemaMismatch`].
pub fn extract(
    document: &str,
    config: &WorksheetConfig,
    namespace: &SpreadsheetNamespace,
) -> Result<HashMap<String, CellRows>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(document, options)
        .map_err(|e| Error::MalformedDocument(e.to_string()))?;

    let ns = namespace.uri.as_str();
    let mut tables: HashMap<String, CellRows> = HashMap::new();

    for worksheet in doc
        .root_element()
        .children()
        .filter(|n| is_element(n, ns, "Worksheet"))
    {
        let Some(name) = worksheet_name(&worksheet, ns) else {
            debug!("Skipping unnamed worksheet");
            continue;
        };
        let Some(spec) = config.get(name) else {
            continue;
        };
        if tables.contains_key(name) {
            warn!("Duplicate worksheet '{}' ignored", name);
            continue;
        }

        let rows = extract_rows(&worksheet, ns, spec.row_start)?;
        debug!(
            "Extracted {} rows from worksheet '{}' (row start {})",
            rows.len(),
            name,
            spec.row_start
        );
        tables.insert(name.to_string(), rows);
    }

    let mut missing: Vec<&str> = config
        .keys()
        .filter(|name| !tables.contains_key(*name))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(Error::SchemaMismatch(format!(
            "worksheet(s) {} not found in document ({}:Worksheet)",
            missing.join(", "),
            namespace.prefix
        )));
    }

    Ok(tables)
}

fn extract_rows(worksheet: &Node, ns: &str, row_start: usize) -> Result<CellRows> {
    worksheet
        .children()
        .filter(|n| is_element(n, ns, "Table"))
        .flat_map(|table| table.children().filter(|n| is_element(n, ns, "Row")))
        .skip(row_start)
        .map(|row| extract_cells(&row, ns))
        .collect()
}

fn extract_cells(row: &Node, ns: &str) -> Result<Vec<Option<String>>> {
    let mut cells = Vec::new();
    for cell in row.children().filter(|n| is_element(n, ns, "Cell")) {
        // ss:Index is 1-based and lets writers elide empty cells.
        if let Some(index) = attribute(&cell, ns, "Index").and_then(|v| v.trim().parse::<usize>().ok()) {
            if index == 0 || index > MAX_SPREADSHEET_COLUMNS {
                return Err(Error::MalformedDocument(format!(
                    "cell index {} outside 1..={}",
                    index, MAX_SPREADSHEET_COLUMNS
                )));
            }
            if index > cells.len() + 1 {
                cells.resize(index - 1, None);
            }
        }
        let value = cell
            .children()
            .find(|n| is_element(n, ns, "Data"))
            .and_then(|data| data_text(&data));
        cells.push(value);
        if cells.len() > MAX_SPREADSHEET_COLUMNS {
            return Err(Error::MalformedDocument(format!(
                "row has more than {} cells",
                MAX_SPREADSHEET_COLUMNS
            )));
        }
    }
    Ok(cells)
}

/// Concatenated text of a `Data` element, including rich-text runs.
fn data_text(data: &Node) -> Option<String> {
    let text: String = data
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn worksheet_name<'a>(worksheet: &Node<'a, '_>, ns: &str) -> Option<&'a str> {
    attribute(worksheet, ns, "Name").or_else(|| worksheet.attributes().next().map(|a| a.value()))
}

fn attribute<'a>(node: &Node<'a, '_>, ns: &str, local: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == local && a.namespace().map_or(true, |uri| uri == ns))
        .map(|a| a.value())
}

fn is_element(node: &Node, ns: &str, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node.tag_name().namespace().unwrap_or("") == ns
}
