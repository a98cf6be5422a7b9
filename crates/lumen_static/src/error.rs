use std::io;
use std::path::PathBuf;

use http::StatusCode;
use http::header::InvalidHeaderValue;
use thiserror::Error;

/// Failures the static service can run into while handling one request.
///
/// `Forbidden` and `NotFound` end the request with an error page.
/// `MetadataUnavailable` and `CompressionFailure` are recovered from inside
/// the service and only surface in logs.
#[derive(Debug, Error)]
pub enum StaticError {
    #[error("request path escapes the document root")]
    Forbidden,

    #[error("cannot read {}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot stat {}: {source}", .path.display())]
    MetadataUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{encoding} compression failed: {source}")]
    CompressionFailure {
        encoding: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("invalid response header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

impl StaticError {
    pub fn status(&self) -> StatusCode {
        match self {
            StaticError::Forbidden => StatusCode::FORBIDDEN,
            StaticError::NotFound { .. } => StatusCode::NOT_FOUND,
            StaticError::MetadataUnavailable { .. }
            | StaticError::CompressionFailure { .. }
            | StaticError::InvalidHeader(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
