//! Error types for the dxseis library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for DX file operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A header line does not match the expected grammar
    #[error("Invalid DX header: {0}")]
    InvalidHeader(String),

    /// A required object (e.g. gridpositions) is absent from the file
    #[error("Object not found: {0}")]
    MissingObject(String),

    /// Data type other than float/int in an array object
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// Data layout this implementation cannot address
    #[error("Unsupported data layout: {0}")]
    UnsupportedLayout(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error in header text
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create an invalid header error.
    pub fn header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }
}

/// Result type alias for dxseis operations.
pub type Result<T> = std::result::Result<T, Error>;
