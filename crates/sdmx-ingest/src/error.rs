//! Error types for SDMX data ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during data ingestion operations.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Data file not found or not readable.
    #[error("data file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Naming Convention Errors ===
    /// Data file name does not follow the catalogue naming convention.
    #[error(
        "could not find catalogue number: {path} does not match the \
         'Generic_CATALOG-NUM.csv' pattern"
    )]
    CatalogueNumber { path: PathBuf },

    // === CSV Errors ===
    /// Failed to read or parse CSV content.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV file has no header row or no data.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// Reshape needs index, pivot and value columns.
    #[error("{path} has {columns} columns, need at least 4 to reshape")]
    TooFewColumns { path: PathBuf, columns: usize },

    // === Data Document Errors ===
    /// Malformed SDMX data document.
    #[error("malformed data document {path}: {message}")]
    DataParse { path: PathBuf, message: String },

    // === Metadata Errors ===
    /// Propagated structure metadata error.
    #[error(transparent)]
    Metadata(#[from] sdmx_model::SdmxError),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::CatalogueNumber {
            path: PathBuf::from("/data/table.csv"),
        };
        assert!(err.to_string().contains("Generic_CATALOG-NUM.csv"));
    }

    #[test]
    fn test_error_from_metadata() {
        let err: IngestError = sdmx_model::SdmxError::PrimaryMeasureMissing.into();
        assert_eq!(
            err.to_string(),
            "structure document declares no primary measure"
        );
    }
}
