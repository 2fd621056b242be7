//! Error types
//!
//! Typed errors for the fetch layer, the row classifier, and scope listings.
//! Binary-level plumbing still uses `anyhow` with context.

use std::num::ParseIntError;
use thiserror::Error;

/// Failure reported by one page fetch against a GCP API
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API answered 404 for the requested scope
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Any other non-success HTTP status
    #[error("API request failed: {status}")]
    Api { status: u16, message: String },

    /// Could not obtain an access token
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FetchError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::NotFound(_) => Some(404),
            FetchError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A raw search result that cannot be normalized into a row
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("could not convert resource id {value:?} of {name:?} to an integer")]
    InvalidResourceId {
        name: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("unsupported asset type {0:?}")]
    UnsupportedAssetType(String),

    #[error("parent resource name {0:?} has fewer than two path segments")]
    MalformedParent(String),
}

/// Error surfaced by a scope listing or a query
#[derive(Debug, Error)]
pub enum Error {
    /// Connection, credential, or client construction failure
    #[error("service error: {0}")]
    Service(String),

    /// Upstream fetch failed with something other than not-found
    #[error(transparent)]
    Fetch(FetchError),

    /// Upstream returned data that violates the row contract
    #[error(transparent)]
    Parse(#[from] ClassifyError),

    /// The row sink refused a row
    #[error("row sink failed: {0}")]
    Sink(String),
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Auth(message) => Error::Service(message),
            other => Error::Fetch(other),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
