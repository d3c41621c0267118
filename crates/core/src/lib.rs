//! Fund Holdings Core - harmonizes broker fund holdings exports.
//!
//! Each asset manager publishes its funds' holdings in its own layout:
//! delimited text, binary workbooks or spreadsheet XML, with broker specific
//! preambles, column names and decimal conventions. This crate turns those
//! exports into one canonical table keyed by (fund ISIN, security ISIN).
//!
//! ```text
//! FundRequest → AdapterRegistry → FormatReader → Harmonizer → Aggregator
//!                                      ↓
//!                           spreadsheet_xml (SpreadsheetML 2003)
//! ```
//!
//! Per-broker behaviour is data (`adapters/brokers.json`), not code.

pub mod adapters;
pub mod constants;
pub mod errors;
pub mod holdings;
pub mod pipeline;
pub mod reader;
pub mod spreadsheet_xml;

pub use adapters::AdapterRegistry;
pub use holdings::{AggregatedHoldingsTable, AggregationConfig};
pub use pipeline::{BatchOutcome, FundFileSource, FundRequest, HoldingsPipeline};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
