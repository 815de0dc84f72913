//! Request error taxonomy
//!
//! Every failure a single request can hit. Client-input errors carry no
//! filesystem detail so their messages are safe to send back verbatim.

use hyper::StatusCode;
use thiserror::Error;

use crate::http::range::RangeError;
use crate::path::PathError;

/// Errors produced while serving one request
#[derive(Debug, Error)]
pub enum ServeError {
    /// The request path escapes the media root
    #[error("Access denied")]
    Forbidden,

    /// No regular file at the requested path
    #[error("File not found")]
    NotFound,

    /// The `Range` header does not match `bytes=<start>-[<end>]`
    #[error("Invalid range header")]
    MalformedRange,

    /// Well-formed range outside the file bounds
    #[error("Range not satisfiable")]
    RangeNotSatisfiable {
        /// Total size of the file the range was checked against
        size: u64,
    },

    /// Unexpected I/O failure after validation passed
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl ServeError {
    /// HTTP status reported for this error
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MalformedRange => StatusCode::BAD_REQUEST,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text sent to the client; never contains paths or OS error text
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Forbidden => "Access denied",
            Self::NotFound => "File not found",
            Self::MalformedRange => "Invalid range header",
            Self::RangeNotSatisfiable { .. } => "Range not satisfiable",
            Self::Io(_) => "Internal server error",
        }
    }
}

impl From<PathError> for ServeError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::Forbidden => Self::Forbidden,
            PathError::NotFound => Self::NotFound,
        }
    }
}

impl From<RangeError> for ServeError {
    fn from(err: RangeError) -> Self {
        match err {
            RangeError::Malformed => Self::MalformedRange,
            RangeError::NotSatisfiable { size } => Self::RangeNotSatisfiable { size },
        }
    }
}
