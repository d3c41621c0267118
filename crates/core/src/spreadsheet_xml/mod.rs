//! Spreadsheet XML module - structural extraction of worksheet tables.

mod extractor;
mod sanitize;

pub use extractor::{extract, CellRows, SpreadsheetNamespace, WorksheetConfig, WorksheetSpec};
pub use sanitize::{escape_bare_ampersands, sanitize_document};
