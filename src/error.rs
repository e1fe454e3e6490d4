//! Error types for bindery operations.

use thiserror::Error;

/// Errors that can occur while building or merging DAISY books.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed input that makes the operation impossible: an invalid
    /// outline, or a part whose package is missing its manifest or spine.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// No qualifying part directories were discovered.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
