use url::Url;

use crate::client::error::ClientError;

/// Base for resolving relative `Location` values; only its path matters.
const PLACEHOLDER_BASE: &str = "http://ferry.invalid/";

/// Turns a `Location` header value into the path to request next.
///
/// Absolute paths are used as sent. Absolute URLs are reduced to their path
/// and query, since the follow-up always goes over the current connection.
/// Relative references resolve against `/`.
pub fn resolve_location(location: &str) -> Result<String, ClientError> {
    let location = location.trim();

    if location.is_empty() {
        return Err(ClientError::MissingLocation);
    }

    if location.starts_with('/') && !location.starts_with("//") {
        return Ok(location.to_string());
    }

    let invalid = || ClientError::InvalidLocation(location.to_string());

    let base = Url::parse(PLACEHOLDER_BASE).map_err(|_| invalid())?;
    let url = base.join(location).map_err(|_| invalid())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }

    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }

    Ok(path)
}
