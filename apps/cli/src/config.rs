use std::path::PathBuf;

use fundholdings_core::constants::DEFAULT_PLACEHOLDER_SECURITY_ISIN;

pub struct Config {
    pub manifest_path: PathBuf,
    pub output_path: PathBuf,
    pub status_path: PathBuf,
    pub adapters_path: Option<PathBuf>,
    pub placeholder_security_isin: String,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset or blank keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let manifest_path = var("FH_MANIFEST").unwrap_or_else(|| "./funds.csv".into());
        let output_path = var("FH_OUTPUT").unwrap_or_else(|| "./holdings.csv".into());
        let status_path = var("FH_STATUS_OUTPUT").unwrap_or_else(|| "./holdings_status.csv".into());
        let adapters_path = var("FH_ADAPTERS").map(PathBuf::from);
        let placeholder_security_isin = var("FH_PLACEHOLDER_ISIN")
            .unwrap_or_else(|| DEFAULT_PLACEHOLDER_SECURITY_ISIN.to_string());
        let log_format = var("FH_LOG_FORMAT").unwrap_or_else(|| "text".into());

        Self {
            manifest_path: PathBuf::from(manifest_path),
            output_path: PathBuf::from(output_path),
            status_path: PathBuf::from(status_path),
            adapters_path,
            placeholder_security_isin,
            log_format,
        }
    }
}
