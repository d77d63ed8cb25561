//! Error types for the TIDAL API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the album/track does not exist" from "the server returned an unexpected
//! status." All other non-2xx responses land in `HttpError` with the raw
//! status code and body for debugging. Login failures are wrapped in
//! `AuthError` so the cause stays inspectable.

use thiserror::Error;

/// Errors returned by session, catalog and pagination operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The endpoint is not a relative reference, or the base URL is invalid.
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    UrlError { endpoint: String, reason: String },

    /// The transport failed before a response was received.
    #[error("request failed: {0}")]
    RequestError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(#[from] serde_json::Error),

    /// Login did not produce a session.
    #[error("login failed: {0}")]
    AuthError(#[source] Box<ApiError>),

    /// The server reported a page size that cannot advance the offset: zero
    /// while items are still pending, or one that overflows it.
    #[error("pagination stalled on `{endpoint}` at offset {offset} of {total}")]
    PaginationStalled {
        endpoint: String,
        offset: usize,
        total: usize,
    },

    /// A configuration value could not be parsed.
    #[error("invalid configuration value for {key}: {reason}")]
    ConfigError { key: String, reason: String },
}

impl ApiError {
    /// Status code carried by the error, if it came from an HTTP response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::HttpError { status, .. } => Some(*status),
            ApiError::AuthError(inner) => inner.status(),
            _ => None,
        }
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        ApiError::RequestError(Box::new(err))
    }
}
