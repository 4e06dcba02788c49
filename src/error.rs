//! Error types for ingestion, windowing and export.
//!
//! Structural problems with a single input row (wrong column count) are not
//! surfaced through this type at runtime: they are logged and the row is
//! skipped. Everything else aborts the current run, because any batch built
//! afterwards would be semantically wrong rather than merely incomplete.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Errors produced by the dataset pipeline.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Input could not be read or output could not be written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Row has the wrong number of columns.
    ///
    /// Only used for diagnostics; ingestion skips such rows.
    #[error("line {line}: expected {expected} columns, found {actual}")]
    Schema {
        /// 1-based line number in the source
        line: usize,
        /// Column count required by the schema
        expected: usize,
        /// Column count found
        actual: usize,
    },

    /// A date column could not be parsed.
    #[error("line {line}: date '{value}' does not match format '{format}'")]
    DateFormat {
        /// 1-based line number in the source
        line: usize,
        /// Raw value
        value: String,
        /// Expected chrono format
        format: String,
    },

    /// A numeric column could not be parsed.
    #[error("line {line}, column {column}: '{value}' is not a number")]
    NumberFormat {
        /// 1-based line number in the source
        line: usize,
        /// 0-based column index
        column: usize,
        /// Raw value
        value: String,
    },

    /// Not enough records to build a single window for the chosen strategy.
    #[error("{strategy}: {available} records available, at least {required} required")]
    InsufficientData {
        /// Strategy (or stage) that rejected the data
        strategy: &'static str,
        /// Records available
        available: usize,
        /// Records required
        required: usize,
    },

    /// `decode` was called with a code that `encode` never produced.
    #[error("column {column}: code {code} was never allocated")]
    UnknownCode {
        /// 0-based column index
        column: usize,
        /// Requested code
        code: u32,
    },

    /// Encoding was requested for a column that is not categorical.
    #[error("column {column} is not a categorical column")]
    InvalidColumn {
        /// 0-based column index
        column: usize,
    },

    /// `next_batch` was called on an exhausted iterator.
    #[error("iterator exhausted, call reset() before requesting more batches")]
    IteratorExhausted,

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// TOML, JSON or NumPy (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DatasetError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error aborts an ingestion or training run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Schema { .. })
    }
}
