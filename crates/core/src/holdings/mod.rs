//! Holdings module - canonical schema, harmonization and aggregation.

mod aggregator;
mod harmonizer;
mod holdings_model;

pub use aggregator::{clean_and_aggregate, AggregationConfig, AggregationReport, AggregationResult};
pub use harmonizer::{harmonize, parse_decimal_cell};
pub use holdings_model::*;
