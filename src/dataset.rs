//! CSV dataset loading
//!
//! The dataset is read from disk on every call. Each row becomes a
//! [`Record`] keyed by the header row, so the column set follows the file.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;

/// One CSV row: column name to cell value
pub type Record = BTreeMap<String, String>;

/// All rows of the file, in file order
pub type Dataset = Vec<Record>;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse dataset '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Read and parse the dataset at `path`
pub async fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    parse_dataset(&bytes).map_err(|source| DatasetError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse CSV bytes whose first row is the header
///
/// Every row must have as many fields as the header and be valid UTF-8.
/// A repeated column name keeps the value of its last occurrence.
pub fn parse_dataset(bytes: &[u8]) -> Result<Dataset, csv::Error> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let headers = reader.headers()?.clone();

    reader
        .records()
        .map(|row| -> Result<Record, csv::Error> {
            let row = row?;
            Ok(headers
                .iter()
                .zip(row.iter())
                .map(|(column, value)| (column.to_string(), value.to_string()))
                .collect())
        })
        .collect()
}
