//! Ledger discovery and loading.
//!
//! Everything between a glob pattern on disk and a `Vec<Transaction>` lives
//! here: file enumeration, preamble stripping, column mapping and numeric
//! parsing. A file either loads completely or fails with a [`LoadError`];
//! the engines never see a partially parsed ledger.

use crate::domain::Transaction;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod columns;
pub mod csv_ledger;

pub use columns::ColumnMap;
pub use csv_ledger::{parse_amount, parse_ledger};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid file pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("expected a header row after skipping {skiprows} rows, but the file has {found} rows")]
    InsufficientRows { skiprows: usize, found: usize },
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("csv parse error: {0}")]
    Csv(String),
    #[error("line {line}: invalid number in column {column}: {value:?}")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("line {line}: {column} is out of range")]
    Overflow { line: u64, column: &'static str },
}

/// Expand a glob pattern into a sorted list of regular files.
///
/// Unreadable directory entries are logged and skipped.
pub fn discover(pattern: &str) -> Result<Vec<PathBuf>, LoadError> {
    let entries = glob::glob(pattern).map_err(|e| LoadError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %e.path().display(), error = %e.error(), "Skipping unreadable path");
            }
        }
    }
    files.sort();
    files.dedup();

    tracing::info!(pattern, files = files.len(), "Discovered ledger files");
    Ok(files)
}

/// Read and parse one ledger file.
pub fn load_file(path: &Path, skiprows: usize) -> Result<Vec<Transaction>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let transactions = parse_ledger(&text, skiprows)?;
    tracing::debug!(
        path = %path.display(),
        skiprows,
        rows = transactions.len(),
        "Loaded ledger"
    );
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sorted_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.csv"), "side,qty,price\n").unwrap();
        fs::write(dir.path().join("a.csv"), "side,qty,price\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let pattern = dir.path().join("*.csv").to_string_lossy().to_string();
        let files = discover(&pattern).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_discover_invalid_pattern() {
        let err = discover("[unclosed").unwrap_err();
        assert!(matches!(err, LoadError::Pattern { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_file(&dir.path().join("missing.csv"), 0).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_load_file_parses_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(&path, "Report v2\nside,qty,price,total\nbuy,2,5,10.5\n").unwrap();

        let txs = load_file(&path, 1).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].gross_value.to_string(), "10.5");
    }
}
