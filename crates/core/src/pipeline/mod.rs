//! Pipeline module - per-fund processing and the parallel batch driver.

mod pipeline_model;
mod pipeline_service;
mod pipeline_traits;

pub use pipeline_model::{BatchOutcome, FundHoldings, FundReport, FundRequest, FundResult};
pub use pipeline_service::HoldingsPipeline;
pub use pipeline_traits::FundFileSource;
