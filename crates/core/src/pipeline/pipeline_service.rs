use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::pipeline_model::{BatchOutcome, FundHoldings, FundReport, FundRequest, FundResult};
use super::pipeline_traits::FundFileSource;
use crate::adapters::AdapterRegistry;
use crate::errors::{Error, Result, ValidationError};
use crate::holdings::{clean_and_aggregate, harmonize, AggregationConfig};
use crate::reader::read_raw_table;

/// Runs broker exports through lookup, read, harmonize and aggregate.
///
/// Holds no per-fund state; one instance may serve many threads.
#[derive(Debug, Clone)]
pub struct HoldingsPipeline {
    registry: Arc<AdapterRegistry>,
    aggregation: AggregationConfig,
}

impl Default for HoldingsPipeline {
    fn default() -> Self {
        Self::new(AdapterRegistry::builtin(), AggregationConfig::default())
    }
}

impl HoldingsPipeline {
    pub fn new(registry: Arc<AdapterRegistry>, aggregation: AggregationConfig) -> Self {
        Self {
            registry,
            aggregation,
        }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn aggregation(&self) -> &AggregationConfig {
        &self.aggregation
    }

    /// Processes one fund's export bytes into its consolidated holdings.
    pub fn process_fund(&self, request: &FundRequest, content: &[u8]) -> Result<FundHoldings> {
        let fund_isin = request.fund_isin.trim();
        if fund_isin.is_empty() {
            return Err(ValidationError::InvalidInput(format!(
                "fund ISIN is empty for broker '{}'",
                request.broker_id
            ))
            .into());
        }

        let adapter = self.registry.lookup(&request.broker_id)?;
        let raw = read_raw_table(adapter, content)?;
        let entries = raw.len();

        let harmonized = harmonize(raw, adapter, fund_isin);
        let result = clean_and_aggregate(harmonized, &self.aggregation)?;

        let report = FundReport::new(
            &adapter.broker_id,
            fund_isin,
            entries,
            result.report,
            result.table.len(),
        );
        debug!(
            "[{}] Fund {} processed: {} entries, {} holdings",
            report.broker_id, report.fund_isin, report.entries, report.holdings
        );

        Ok(FundHoldings {
            table: result.table,
            report,
        })
    }

    /// Fetches and processes every request in parallel.
    ///
    /// Results keep request order. A failing fund is logged and reported in
    /// its own slot; it never stops the batch, even when a reader panics.
    pub fn process_batch<S>(&self, source: &S, requests: &[FundRequest]) -> BatchOutcome
    where
        S: FundFileSource + ?Sized,
    {
        info!("Processing {} fund exports.", requests.len());

        let results: Vec<FundResult> = requests
            .par_iter()
            .map(|request| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    self.fetch(source, request)
                        .and_then(|content| self.process_fund(request, &content))
                }))
                .unwrap_or_else(|payload| Err(Error::Internal(panic_message(payload.as_ref()))));
                if let Err(e) = &outcome {
                    error!(
                        "[{}] Fund {} failed ({}): {}",
                        request.broker_id,
                        request.fund_isin,
                        e.code(),
                        e
                    );
                }
                FundResult {
                    request: request.clone(),
                    outcome,
                }
            })
            .collect();

        let outcome = BatchOutcome { results };
        if outcome.failure_count() > 0 {
            warn!(
                "{} of {} funds failed; see per-fund results.",
                outcome.failure_count(),
                outcome.len()
            );
        }
        info!(
            "Batch finished: {} funds processed, {} holdings in total.",
            outcome.success_count(),
            outcome.successes().map(|h| h.report.holdings).sum::<usize>()
        );
        outcome
    }

    fn fetch<S>(&self, source: &S, request: &FundRequest) -> Result<Vec<u8>>
    where
        S: FundFileSource + ?Sized,
    {
        source.fetch(request).map_err(|e| match e {
            Error::SourceUnavailable { .. } => e,
            other => Error::SourceUnavailable {
                fund_isin: request.fund_isin.clone(),
                reason: other.to_string(),
            },
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic without message".to_string())
}
