//! Delimited text parsing for broker holdings exports.
//!
//! Handles the preamble most brokers put above the header row, delimiter
//! auto-detection, and legacy encodings.

use csv::{ReaderBuilder, Terminator};
use serde::{Deserialize, Serialize};

use super::encoding::decode_bytes;
use crate::adapters::SourceKind;
use crate::errors::{Error, Result};

/// Configuration for delimited text parsing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParseConfig {
    /// Delimiter character: ",", ";", "\t", or "auto" (default: "auto")
    pub delimiter: Option<String>,
    /// Number of lines to skip above the header row (default: 0)
    pub skip_top_rows: Option<usize>,
}

impl ParseConfig {
    /// Returns the effective delimiter, defaulting to "auto"
    pub fn effective_delimiter(&self) -> &str {
        self.delimiter.as_deref().unwrap_or("auto")
    }

    /// Returns the number of lines to skip at the top
    pub fn top_skip(&self) -> usize {
        self.skip_top_rows.unwrap_or(0)
    }
}

/// Result of parsing a delimited file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCsvResult {
    /// Header row (the first row after the skipped preamble)
    pub headers: Vec<String>,
    /// Data rows, each normalized to the header width
    pub rows: Vec<Vec<String>>,
    /// The delimiter actually used
    pub delimiter: String,
    /// Non-fatal problems encountered during parsing
    pub errors: Vec<ParseError>,
}

/// Non-fatal problem encountered during parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseError {
    /// Row index where the error occurred (if applicable)
    pub row_index: Option<usize>,
    /// Human-readable error message
    pub message: String,
    /// Error type: "parse", "encoding", "structure"
    pub error_type: String,
}

impl ParseError {
    fn new_parse(row: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            row_index: row,
            message: message.into(),
            error_type: "parse".to_string(),
        }
    }

    fn encoding_error(message: impl Into<String>) -> Self {
        Self {
            row_index: None,
            message: message.into(),
            error_type: "encoding".to_string(),
        }
    }

    fn structure_error(row: usize, message: impl Into<String>) -> Self {
        Self {
            row_index: Some(row),
            message: message.into(),
            error_type: "structure".to_string(),
        }
    }
}

fn unreadable(reason: impl Into<String>) -> Error {
    Error::unreadable(SourceKind::DelimitedText, reason)
}

/// Parses delimited content with the given configuration.
///
/// The first `skip_top_rows` lines are discarded and the next one becomes
/// the header. Fails when nothing is left to use as a header.
pub fn parse_csv(content: &[u8], config: &ParseConfig) -> Result<ParsedCsvResult> {
    let mut errors = Vec::new();

    let decoded = decode_bytes(content);
    if let Some(warning) = decoded.warning {
        errors.push(ParseError::encoding_error(warning));
    }

    let delimiter = detect_delimiter(&decoded.text, config);
    let delimiter_byte = match delimiter.as_bytes() {
        [byte] => *byte,
        _ => {
            return Err(Error::Configuration(format!(
                "delimiter '{}' must be a single ASCII character",
                delimiter
            )))
        }
    };
    let (headers, rows) = parse_csv_content(&decoded.text, delimiter_byte, config, &mut errors)?;

    Ok(ParsedCsvResult {
        headers,
        rows,
        delimiter,
        errors,
    })
}

/// Auto-detects the delimiter by analyzing the lines below the preamble.
fn detect_delimiter(content: &str, config: &ParseConfig) -> String {
    let delimiter_setting = config.effective_delimiter();

    if delimiter_setting != "auto" {
        return match delimiter_setting {
            "\\t" | "\t" => "\t".to_string(),
            "" => ",".to_string(),
            other => other.to_string(),
        };
    }

    // Try common delimiters and pick the one with most consistent columns
    let sample: Vec<&str> = content.lines().skip(config.top_skip()).take(10).collect();
    let delimiters = [',', ';', '\t'];
    let mut best_delimiter = ',';
    let mut best_score = 0usize;

    for delim in delimiters {
        let score = score_delimiter(&sample, delim);
        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    best_delimiter.to_string()
}

/// Scores a delimiter by counting consistent column counts across lines.
fn score_delimiter(lines: &[&str], delimiter: char) -> usize {
    let counts: Vec<usize> = lines
        .iter()
        .map(|line| line.matches(delimiter).count())
        .collect();

    let Some(&first_count) = counts.first() else {
        return 0;
    };
    let consistent_count = counts.iter().filter(|&&c| c == first_count).count();

    // Prefer delimiters that have at least one occurrence and are consistent
    first_count * consistent_count
}

/// Parses content and returns the header and normalized data rows.
fn parse_csv_content(
    content: &str,
    delimiter: u8,
    config: &ParseConfig,
    errors: &mut Vec<ParseError>,
) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let skip_top = config.top_skip();

    // Preamble rows are physical lines; the csv reader would silently drop blank ones.
    let body = skip_lines(content, skip_top).ok_or_else(|| {
        unreadable(format!(
            "cannot skip {} rows from a file with {} rows",
            skip_top,
            content.lines().count()
        ))
    })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false) // The header is located after the preamble
        .flexible(true) // Preamble rows rarely match the table width
        .terminator(Terminator::Any(b'\n'))
        .from_reader(body.as_bytes());

    let mut all_records: Vec<Vec<String>> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let row: Vec<String> = record
                    .iter()
                    .map(|s| s.trim_end_matches('\r').to_string())
                    .collect();
                all_records.push(row);
            }
            Err(e) => {
                errors.push(ParseError::new_parse(
                    Some(idx),
                    format!("Failed to parse row {}: {}", idx + 1, e),
                ));
            }
        }
    }

    if all_records.is_empty() {
        return Err(unreadable(if skip_top > 0 {
            "no header row found after the preamble"
        } else {
            "file is empty or contains no valid records"
        }));
    }

    let mut working = all_records
        .into_iter()
        .filter(|row| !row.iter().all(|cell| cell.trim().is_empty()));

    let Some(header_row) = working.next() else {
        return Err(unreadable("no header row found after the preamble"));
    };
    let headers: Vec<String> = header_row.iter().map(|h| h.trim().to_string()).collect();
    let header_count = headers.len();

    let rows = working
        .enumerate()
        .map(|(idx, mut row)| {
            if row.len() < header_count {
                row.resize(header_count, String::new());
            } else if row.len() > header_count {
                errors.push(ParseError::structure_error(
                    idx,
                    format!(
                        "Row {} has {} columns, expected {}. Extra columns ignored.",
                        idx + 1,
                        row.len(),
                        header_count
                    ),
                ));
                row.truncate(header_count);
            }
            row
        })
        .collect();

    Ok((headers, rows))
}

/// Returns the content after the first `count` lines, or `None` when the
/// content has fewer lines.
fn skip_lines(content: &str, count: usize) -> Option<&str> {
    let mut rest = content;
    for _ in 0..count {
        if rest.is_empty() {
            return None;
        }
        rest = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => "",
        };
    }
    Some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let content = b"ISIN,Name,Weighting\nDE000A,Foo,30\nUS000B,Bar,20";
        let result = parse_csv(content, &ParseConfig::default()).unwrap();

        assert_eq!(result.headers, vec!["ISIN", "Name", "Weighting"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0], vec!["DE000A", "Foo", "30"]);
        assert_eq!(result.delimiter, ",");
    }

    #[test]
    fn test_parse_semicolon_delimiter() {
        let content = b"ISIN;Name;Weight\nDE000A;Foo;30,5\nUS000B;Bar;20";
        let result = parse_csv(content, &ParseConfig::default()).unwrap();

        assert_eq!(result.headers, vec!["ISIN", "Name", "Weight"]);
        assert_eq!(result.rows[0][2], "30,5");
        assert_eq!(result.delimiter, ";");
    }

    #[test]
    fn test_parse_tab_delimiter() {
        let content = b"ISIN\tName\nDE000A\tFoo";
        let result = parse_csv(content, &ParseConfig::default()).unwrap();

        assert_eq!(result.headers, vec!["ISIN", "Name"]);
        assert_eq!(result.delimiter, "\t");
    }

    #[test]
    fn test_skip_preamble_rows() {
        let content = b"Fund Holdings as of,\"17.Okt.2026\"\n\xC2\xA0\nISIN,Name,Gewichtung (%)\nDE000A,Foo,\"1,25\"";
        let config = ParseConfig {
            delimiter: Some(",".to_string()),
            skip_top_rows: Some(2),
            ..Default::default()
        };
        let result = parse_csv(content, &config).unwrap();

        assert_eq!(result.headers, vec!["ISIN", "Name", "Gewichtung (%)"]);
        assert_eq!(result.rows, vec![vec!["DE000A", "Foo", "1,25"]]);
    }

    #[test]
    fn test_blank_preamble_lines_are_counted() {
        let content = b"Fund,L&G\n\nAs of,17/10/2026\n\nCOMPONENTS,ISIN,Weight\nFoo,DE000A,1.5\n";
        let config = ParseConfig {
            delimiter: Some(",".to_string()),
            skip_top_rows: Some(4),
            ..Default::default()
        };
        let result = parse_csv(content, &config).unwrap();
        assert_eq!(result.headers, vec!["COMPONENTS", "ISIN", "Weight"]);
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_auto_detection_ignores_preamble() {
        let content = b"Title line, with comma\nISIN;Name;Weight\nDE000A;Foo;1\nUS000B;Bar;2";
        let config = ParseConfig {
            skip_top_rows: Some(1),
            ..Default::default()
        };
        let result = parse_csv(content, &config).unwrap();
        assert_eq!(result.delimiter, ";");
        assert_eq!(result.headers, vec!["ISIN", "Name", "Weight"]);
    }

    #[test]
    fn test_skip_empty_rows() {
        let content = b"ISIN,Weight\nA,30\n,\nB,25";
        let result = parse_csv(content, &ParseConfig::default()).unwrap();
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_utf8_bom() {
        let content = b"\xEF\xBB\xBFISIN,Weight\nA,30";
        let result = parse_csv(content, &ParseConfig::default()).unwrap();
        assert_eq!(result.headers, vec!["ISIN", "Weight"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = b"ISIN,Weight\r\nA,30\r\n";
        let result = parse_csv(content, &ParseConfig::default()).unwrap();
        assert_eq!(result.headers, vec!["ISIN", "Weight"]);
        assert_eq!(result.rows[0], vec!["A", "30"]);
    }

    #[test]
    fn test_uneven_columns() {
        let content = b"a,b,c\n1,2\n3,4,5,6";
        let result = parse_csv(content, &ParseConfig::default()).unwrap();

        assert_eq!(result.rows[0], vec!["1", "2", ""]);
        assert_eq!(result.rows[1], vec!["3", "4", "5"]);
        assert!(result.errors.iter().any(|e| e.error_type == "structure"));
    }

    #[test]
    fn test_empty_file_is_unreadable() {
        let result = parse_csv(b"", &ParseConfig::default());
        assert!(matches!(result, Err(Error::UnreadableFile { .. })));
    }

    #[test]
    fn test_skip_beyond_end_is_unreadable() {
        let config = ParseConfig {
            skip_top_rows: Some(16),
            ..Default::default()
        };
        let result = parse_csv(b"ISIN,Weight\nA,1", &config);
        assert!(matches!(result, Err(Error::UnreadableFile { .. })));
    }

    #[test]
    fn test_non_ascii_delimiter_is_rejected() {
        let config = ParseConfig {
            delimiter: Some("§".to_string()),
            ..Default::default()
        };
        let result = parse_csv("ISIN§Weight\nA§1".as_bytes(), &config);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
