//! Fund manifest: one `broker_id,fund_isin,location` line per export.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use fundholdings_core::FundRequest;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    broker_id: String,
    fund_isin: String,
    location: String,
}

pub fn read_manifest(path: &Path) -> anyhow::Result<Vec<FundRequest>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open manifest {}", path.display()))?;
    parse_manifest(file).with_context(|| format!("Invalid manifest {}", path.display()))
}

fn parse_manifest(reader: impl Read) -> anyhow::Result<Vec<FundRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut requests = Vec::new();
    for (index, record) in reader.deserialize::<ManifestEntry>().enumerate() {
        let entry = record.with_context(|| format!("Manifest line {}", index + 2))?;
        if entry.broker_id.is_empty() || entry.fund_isin.is_empty() || entry.location.is_empty() {
            bail!("Manifest line {} has an empty field", index + 2);
        }
        requests.push(FundRequest::new(entry.broker_id, entry.fund_isin, entry.location));
    }
    Ok(requests)
}
