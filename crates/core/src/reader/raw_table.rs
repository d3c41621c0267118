use serde::{Deserialize, Serialize};

/// Header row plus body rows of raw cells, as read from a broker file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    /// Splits extracted rows into header and body. Returns `None` when there
    /// is no row to use as header.
    pub fn from_rows(mut rows: Vec<Vec<Option<String>>>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let header_row = rows.remove(0);
        let headers = header_row
            .into_iter()
            .map(|h| h.map(|s| s.trim().to_string()).unwrap_or_default())
            .collect();
        Some(Self { headers, rows })
    }

    /// Builds a table from string rows, e.g. parsed delimited text.
    pub fn from_strings(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect();
        Self { headers, rows }
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
