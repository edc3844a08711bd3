//! Centralized error handling for ncreader
//!
//! Every fallible operation in the crate returns [`Result`], so callers can tell
//! "the selection is empty" apart from "the request was malformed" instead of
//! receiving a silent `None` or a NaN.

use thiserror::Error;

/// Stable discriminant of [`NcReaderError`], independent of the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    FormatError,
    UnknownDimension,
    IndexOutOfRange,
    InvalidRange,
    EmptyData,
    UnsupportedRank,
    DatasetClosed,
    InvalidSlice,
    Io,
    Other,
}

/// What a [`NcReaderError::NotFound`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Path,
    Variable,
    Dimension,
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Path => write!(f, "File"),
            Missing::Variable => write!(f, "Variable"),
            Missing::Dimension => write!(f, "Dimension"),
        }
    }
}

/// Main error type for ncreader operations
#[derive(Debug, Error)]
pub enum NcReaderError {
    /// A path, variable or dataset dimension does not exist
    #[error("{kind} '{name}' not found")]
    NotFound { kind: Missing, name: String },

    /// The container exists but could not be parsed
    #[error("Cannot read '{path}' as NetCDF: {source}")]
    FormatError {
        path: String,
        #[source]
        source: netcdf::Error,
    },

    /// A slice specification names a dimension the variable does not have
    #[error("Dimension '{dim}' not found in variable '{var}'")]
    UnknownDimension { var: String, dim: String },

    /// An integer or list index lies outside `[0, len)`
    #[error("Index {index} out of range for dimension '{dim}' of length {len}")]
    IndexOutOfRange { dim: String, index: i64, len: usize },

    /// A contiguous range with `start >= end` or `start < 0`
    #[error("Invalid range {start}:{end} for dimension '{dim}'")]
    InvalidRange { dim: String, start: i64, end: i64 },

    /// Statistics requested on a selection without a single non-missing value
    #[error("No valid (non-missing) data in '{var}'")]
    EmptyData { var: String },

    /// Export or plotting was asked for a rank it does not handle
    #[error("Cannot {operation} {rank}-dimensional data of '{var}'; slice it to rank 1 or 2 first")]
    UnsupportedRank {
        var: String,
        rank: usize,
        operation: &'static str,
    },

    /// The dataset handle was used after `close`
    #[error("Dataset '{path}' has been closed")]
    DatasetClosed { path: String },

    /// The number of values read does not match the declared shape
    #[error("Variable '{var}' returned {actual} values, expected {expected}")]
    ShapeMismatch {
        var: String,
        expected: usize,
        actual: usize,
    },

    /// Malformed slice text from the command line
    #[error("Invalid slice specification: {message}")]
    InvalidSlice { message: String },

    /// NetCDF library errors outside of opening a file
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited table errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A table cell that is neither a number nor the missing marker
    #[error("Cannot parse '{value}' in row {row}, column '{column}'")]
    TableParse {
        row: usize,
        column: String,
        value: String,
    },

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    Array(#[from] ndarray::ShapeError),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Plot backend errors
    #[error("Render error: {0}")]
    Render(String),
}

impl NcReaderError {
    pub fn variable_not_found(name: impl Into<String>) -> Self {
        NcReaderError::NotFound {
            kind: Missing::Variable,
            name: name.into(),
        }
    }

    /// Coarse classification used by the CLI and by tests
    pub fn kind(&self) -> ErrorKind {
        match self {
            NcReaderError::NotFound { .. } => ErrorKind::NotFound,
            NcReaderError::FormatError { .. } => ErrorKind::FormatError,
            NcReaderError::UnknownDimension { .. } => ErrorKind::UnknownDimension,
            NcReaderError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            NcReaderError::InvalidRange { .. } => ErrorKind::InvalidRange,
            NcReaderError::EmptyData { .. } => ErrorKind::EmptyData,
            NcReaderError::UnsupportedRank { .. } => ErrorKind::UnsupportedRank,
            NcReaderError::DatasetClosed { .. } => ErrorKind::DatasetClosed,
            NcReaderError::InvalidSlice { .. } => ErrorKind::InvalidSlice,
            NcReaderError::Io(_) | NcReaderError::Csv(_) => ErrorKind::Io,
            NcReaderError::ShapeMismatch { .. }
            | NcReaderError::TableParse { .. }
            | NcReaderError::NetCDF(_)
            | NcReaderError::Array(_)
            | NcReaderError::ThreadPool(_)
            | NcReaderError::Render(_) => ErrorKind::Other,
        }
    }
}

/// Result type alias for ncreader operations
pub type Result<T> = std::result::Result<T, NcReaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = NcReaderError::UnknownDimension {
            var: "temperature".to_string(),
            dim: "depth".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Dimension 'depth' not found in variable 'temperature'"
        );
        assert_eq!(err.kind(), ErrorKind::UnknownDimension);

        let err = NcReaderError::variable_not_found("salinity");
        assert_eq!(err.to_string(), "Variable 'salinity' not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = NcReaderError::IndexOutOfRange {
            dim: "time".to_string(),
            index: 100,
            len: 100,
        };
        assert!(err.to_string().contains("length 100"));
    }
}
