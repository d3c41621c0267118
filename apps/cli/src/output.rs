//! Delimited outputs: the combined holdings table and the per-fund status table.

use std::path::Path;

use anyhow::Context;
use fundholdings_core::constants::REQUIRED_COLUMNS;
use fundholdings_core::{AggregatedHoldingsTable, BatchOutcome};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatusRecord<'a> {
    broker: &'a str,
    fund: &'a str,
    status: &'static str,
    entries: Option<usize>,
    holdings: Option<usize>,
    error: Option<String>,
}

fn create_writer(path: &Path) -> anyhow::Result<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))
}

pub fn write_holdings(path: &Path, table: &AggregatedHoldingsTable) -> anyhow::Result<()> {
    let mut writer = create_writer(path)?;
    // A batch where every fund failed has no columns; keep the file parseable.
    let headers = if table.columns.is_empty() {
        REQUIRED_COLUMNS.to_vec()
    } else {
        table.headers()
    };
    writer.write_record(&headers)?;
    for record in table.records() {
        writer.write_record(&record)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_status(path: &Path, outcome: &BatchOutcome) -> anyhow::Result<()> {
    let mut writer = create_writer(path)?;
    for result in &outcome.results {
        let record = match &result.outcome {
            Ok(holdings) => StatusRecord {
                broker: &result.request.broker_id,
                fund: &result.request.fund_isin,
                status: "ok",
                entries: Some(holdings.report.entries),
                holdings: Some(holdings.report.holdings),
                error: None,
            },
            Err(e) => StatusRecord {
                broker: &result.request.broker_id,
                fund: &result.request.fund_isin,
                status: "error",
                entries: None,
                holdings: None,
                error: Some(format!("{}: {}", e.code(), e)),
            },
        };
        writer.serialize(record)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
