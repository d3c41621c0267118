use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use fundholdings_core::{AdapterRegistry, AggregationConfig, HoldingsPipeline};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::manifest::read_manifest;
use crate::output::{write_holdings, write_status};
use crate::source::LocalFileSource;

/// Totals of one run, for the final log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub funds: usize,
    pub succeeded: usize,
    pub holdings: usize,
}

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_pipeline(config: &Config) -> anyhow::Result<HoldingsPipeline> {
    let registry = match &config.adapters_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read adapter table {}", path.display()))?;
            let registry = AdapterRegistry::from_json(&json)
                .with_context(|| format!("Invalid adapter table {}", path.display()))?;
            tracing::info!("Loaded {} adapters from {}", registry.len(), path.display());
            Arc::new(registry)
        }
        None => AdapterRegistry::builtin(),
    };
    let aggregation = AggregationConfig {
        placeholder_security_isin: config.placeholder_security_isin.clone(),
    };
    Ok(HoldingsPipeline::new(registry, aggregation))
}

/// Reads the manifest, processes every fund and writes both output tables.
///
/// Per-fund failures end up in the status table; only manifest, adapter table
/// and output I/O errors abort the run.
pub fn run(config: &Config) -> anyhow::Result<RunSummary> {
    let pipeline = build_pipeline(config)?;
    let requests = read_manifest(&config.manifest_path)?;
    let base_dir = config
        .manifest_path
        .parent()
        .unwrap_or_else(|| Path::new("."));
    let source = LocalFileSource::new(base_dir);

    let outcome = pipeline.process_batch(&source, &requests);
    for failure in outcome.failures() {
        if let Err(e) = &failure.outcome {
            tracing::warn!(
                broker = %failure.request.broker_id,
                fund = %failure.request.fund_isin,
                code = e.code(),
                "Fund skipped: {}",
                e
            );
        }
    }

    let combined = outcome.combined_table();
    write_holdings(&config.output_path, &combined)?;
    write_status(&config.status_path, &outcome)?;

    Ok(RunSummary {
        funds: outcome.len(),
        succeeded: outcome.success_count(),
        holdings: combined.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const LG_CSV: &str = "Legal & General UCITS ETF Plc\n\
        Fund Name,L&G Cyber Security UCITS ETF\n\
        Fund ISIN,IE00BYPLS672\n\
        \n\
        As of,17/10/2026\n\
        Currency,USD\n\
        \n\
        Notes,Holdings are subject to change\n\
        \n\
        \n\
        \n\
        \n\
        \n\
        \n\
        \n\
        \n\
        COMPONENTS,ISIN,Weight\n\
        CROWDSTRIKE,US22788C1053,6.51\n\
        PALO ALTO NETWORKS,US6974351057,5.2\n\
        CASH,-,0.3\n";

    fn config_in(dir: &Path) -> Config {
        Config {
            manifest_path: dir.join("funds.csv"),
            output_path: dir.join("out").join("holdings.csv"),
            status_path: dir.join("out").join("status.csv"),
            adapters_path: None,
            placeholder_security_isin: "-".to_string(),
            log_format: "text".to_string(),
        }
    }

    #[test]
    fn test_run_writes_combined_and_status_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("exports")).unwrap();
        std::fs::write(dir.path().join("exports").join("lg.csv"), LG_CSV).unwrap();
        std::fs::write(
            dir.path().join("funds.csv"),
            "broker_id,fund_isin,location\n\
             L&G,IE00BYPLS672,exports/lg.csv\n\
             L&G,IE00BK5BCD43,exports/missing.csv\n\
             Unknown,IE00B4L5Y983,exports/lg.csv\n",
        )
        .unwrap();
        let config = config_in(dir.path());

        let summary = run(&config).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                funds: 3,
                succeeded: 1,
                holdings: 3
            }
        );
        let holdings = std::fs::read_to_string(&config.output_path).unwrap();
        let lines: Vec<&str> = holdings.lines().collect();
        assert_eq!(lines[0], "fundIsin,securityIsin,name,weight");
        assert_eq!(lines[1], "IE00BYPLS672,-,,0.3");
        assert_eq!(lines[2], "IE00BYPLS672,US22788C1053,CROWDSTRIKE,6.51");

        let status = std::fs::read_to_string(&config.status_path).unwrap();
        let lines: Vec<&str> = status.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "L&G,IE00BYPLS672,ok,3,3,");
        assert!(lines[2].starts_with("L&G,IE00BK5BCD43,error,,,SOURCE_UNAVAILABLE"));
        assert!(lines[3].starts_with("Unknown,IE00B4L5Y983,error,,,UNKNOWN_BROKER"));
    }

    #[test]
    fn test_run_fails_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        assert!(run(&config).is_err());
        assert!(!config.output_path.exists());
    }

    #[test]
    fn test_custom_adapter_table() {
        let dir = tempfile::tempdir().unwrap();
        let adapters = dir.path().join("brokers.json");
        std::fs::write(
            &adapters,
            r#"{"version": 1, "adapters": [{
                "brokerId": "Inhouse",
                "sourceKind": "delimitedText",
                "columnRenameMap": {"Isin": "securityIsin", "Pct": "weight"},
                "canonicalColumns": ["fundIsin", "securityIsin", "weight"],
                "decimalStyle": "comma"
            }]}"#,
        )
        .unwrap();
        let mut config = config_in(dir.path());
        config.adapters_path = Some(adapters);

        let pipeline = build_pipeline(&config).unwrap();
        assert!(pipeline.registry().contains("Inhouse"));
        assert!(!pipeline.registry().contains("iShares"));

        config.adapters_path = Some(PathBuf::from(dir.path().join("missing.json")));
        assert!(build_pipeline(&config).is_err());
    }
}
