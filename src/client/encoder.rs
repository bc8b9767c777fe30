use std::borrow::Cow;

use crate::http::request::{Method, RequestBuilder};
use crate::http::writer::serialize_request;

/// Encodes a GET for `path`.
///
/// The path goes on the wire exactly as given: no escaping, no decoding, no
/// normalization. Validation is left to the server.
///
/// ```
/// # use ferry::client::encoder::encode_get;
/// assert_eq!(
///     encode_get("/index.html", "localhost"),
///     b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n".to_vec()
/// );
/// ```
pub fn encode_get(path: &str, host: &str) -> Vec<u8> {
    let request = RequestBuilder::new(Method::GET, path)
        .header("Host", host)
        .build();

    serialize_request(&request)
}

/// Turns one raw input line into the path to request.
///
/// A trailing `\r` is dropped. Anything else goes through unchanged, except
/// that bytes which are not UTF-8 become U+FFFD so the line is still sent
/// (and answered 404) instead of ending the session.
///
/// ```
/// # use ferry::client::encoder::path_from_line;
/// assert_eq!(path_from_line(b"/index.html\r"), "/index.html");
/// assert_eq!(path_from_line(b"/\xff.html"), "/\u{fffd}.html");
/// ```
pub fn path_from_line(line: &[u8]) -> Cow<'_, str> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    let path = String::from_utf8_lossy(line);
    if let Cow::Owned(_) = path {
        tracing::warn!(path = %path, "Input line is not valid UTF-8, sending it with replacements");
    }

    path
}
