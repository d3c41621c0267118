//! Byte provider contract for the batch driver.

use super::pipeline_model::FundRequest;
use crate::errors::Result;

/// Supplies the raw export bytes for one fund.
///
/// Implementations decide how `location` is interpreted (local path, URL,
/// object key). The batch driver calls `fetch` from worker threads.
pub trait FundFileSource: Send + Sync {
    fn fetch(&self, request: &FundRequest) -> Result<Vec<u8>>;
}
