use std::path::{Path, PathBuf};

use fundholdings_core::{Error, FundFileSource, FundRequest, Result};

/// Reads fund exports from the local filesystem.
///
/// Relative locations resolve against `base_dir`, normally the manifest's directory.
pub struct LocalFileSource {
    base_dir: PathBuf,
}

impl LocalFileSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn resolve(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl FundFileSource for LocalFileSource {
    fn fetch(&self, request: &FundRequest) -> Result<Vec<u8>> {
        let path = self.resolve(&request.location);
        std::fs::read(&path).map_err(|e| Error::SourceUnavailable {
            fund_isin: request.fund_isin.clone(),
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_relative_to_base_dir() {
        let source = LocalFileSource::new("/data/exports");
        assert_eq!(source.resolve("dax.csv"), PathBuf::from("/data/exports/dax.csv"));
        assert_eq!(source.resolve("/tmp/x.xls"), PathBuf::from("/tmp/x.xls"));
    }

    #[test]
    fn test_fetch_reads_file_or_reports_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dax.csv"), b"ISIN\n").unwrap();
        let source = LocalFileSource::new(dir.path());

        let found = source.fetch(&FundRequest::new("iShares", "DE1", "dax.csv")).unwrap();
        assert_eq!(found, b"ISIN\n");

        let err = source
            .fetch(&FundRequest::new("iShares", "DE2", "missing.csv"))
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { ref fund_isin, .. } if fund_isin == "DE2"));
    }
}
