//! Error types for kniga operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a conversion, export, or import.
///
/// Recoverable conditions (an image that cannot be found, an anchor of an
/// unknown kind) are logged and never surface here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("document has no title")]
    MissingTitle,

    #[error("document declares neither revdate nor docdate")]
    MissingDate,

    #[error("cannot parse {attribute} attribute as a date: {value:?}")]
    InvalidDate { attribute: String, value: String },

    #[error("cannot read resource {}: {source}", path.display())]
    ResourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid FB2: {0}")]
    InvalidFb2(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
