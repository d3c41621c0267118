//! Reader module - raw tables from broker file bytes.

mod csv_parser;
mod encoding;
mod format_reader;
mod raw_table;
mod workbook;

pub use csv_parser::{parse_csv, ParseConfig, ParseError, ParsedCsvResult};
pub use encoding::{decode_bytes, strip_utf8_boms, DecodedText};
pub use format_reader::{read_raw_table, FormatReader};
pub use raw_table::RawTable;
pub use workbook::read_worksheet;
