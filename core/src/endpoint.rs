//! Joins the API base URL with relative endpoint paths.

use url::Url;

use crate::error::ApiError;

/// Resolve `endpoint` against `base` using URL reference resolution.
///
/// `base` should end in `/` for its last path segment to be kept, exactly
/// as with any relative reference. Absolute and scheme-relative endpoints
/// are rejected so a request can never leave the configured host.
pub fn resolve(base: &Url, endpoint: &str) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::UrlError {
        endpoint: endpoint.to_string(),
        reason,
    };

    if endpoint.starts_with("//") || Url::parse(endpoint).is_ok() {
        return Err(invalid("expected a relative reference".to_string()));
    }

    base.join(endpoint).map_err(|e| invalid(e.to_string()))
}

/// Parse a configured base URL.
pub fn parse_base(base_url: &str) -> Result<Url, ApiError> {
    let url = Url::parse(base_url).map_err(|e| ApiError::UrlError {
        endpoint: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ApiError::UrlError {
            endpoint: base_url.to_string(),
            reason: "cannot be used as a base URL".to_string(),
        });
    }
    Ok(url)
}
