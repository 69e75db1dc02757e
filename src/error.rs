//! Error types for the apadoc library.

use std::io;
use thiserror::Error;

/// Result type alias for apadoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while formatting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not recognized as a DOCX container.
    #[error("Unknown file format: not a valid DOCX")]
    UnknownFormat,

    /// Error reading the ZIP container.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Error parsing WordprocessingML.
    #[error("XML error: {0}")]
    Xml(String),

    /// A required package part is missing from the archive.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// Text content is not valid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Error assembling the output document.
    #[error("Write error: {0}")]
    Write(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => {
                Error::MissingPart("file not found in archive".into())
            }
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::Encoding(err.to_string())
    }
}
