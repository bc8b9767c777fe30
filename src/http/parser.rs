use crate::http::headers::Headers;
use crate::http::request::{Method, Request};
use thiserror::Error;

/// Upper bound on a request or response head (start line plus headers).
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request line")]
    InvalidRequest,
    #[error("unsupported method")]
    InvalidMethod,
    #[error("unsupported HTTP version")]
    InvalidVersion,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("missing Content-Length")]
    MissingContentLength,
    #[error("malformed status line")]
    InvalidStatusLine,
    #[error("message head exceeds 64 KiB")]
    HeadTooLarge,
    #[error("incomplete message")]
    Incomplete,
}

/// Status line and headers of a response, as read by the client.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
}

/// Parses one request from the front of `buf`.
///
/// Returns the request and the number of bytes it occupied. Only
/// `GET <path> HTTP/1.1` request lines are accepted; the path itself is not
/// validated here.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let headers_end = locate_head(buf)?;
    let body_bytes = &buf[headers_end + 4..];

    let (start_line, headers) = split_head(&buf[..headers_end], ParseError::InvalidRequest)?;

    let parts: Vec<&str> = start_line.split(' ').collect();
    let &[method_str, path, version] = parts.as_slice() else {
        return Err(ParseError::InvalidRequest);
    };

    let method = Method::from_token(method_str).ok_or(ParseError::InvalidMethod)?;

    if version != HTTP_VERSION {
        return Err(ParseError::InvalidVersion);
    }

    // Body
    let content_length = headers.content_length()?.unwrap_or(0);

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let body = body_bytes[..content_length].to_vec();

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body,
    };

    let total_consumed = headers_end + 4 + content_length;
    Ok((request, total_consumed))
}

/// Parses a response status line and headers from the front of `buf`.
///
/// Returns the head and the number of bytes it occupied; the body starts
/// right after. The body itself is not touched.
pub fn parse_response_head(buf: &[u8]) -> Result<(ResponseHead, usize), ParseError> {
    let headers_end = locate_head(buf)?;

    let (status_line, headers) = split_head(&buf[..headers_end], ParseError::InvalidStatusLine)?;

    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().ok_or(ParseError::InvalidStatusLine)?;
    let code = parts.next().ok_or(ParseError::InvalidStatusLine)?;
    let reason = parts.next().unwrap_or("");

    if !version.starts_with("HTTP/1.") {
        return Err(ParseError::InvalidStatusLine);
    }

    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidStatusLine);
    }
    let status = code.parse::<u16>().map_err(|_| ParseError::InvalidStatusLine)?;

    let head = ResponseHead {
        version: version.to_string(),
        status,
        reason: reason.to_string(),
        headers,
    };

    Ok((head, headers_end + 4))
}

/// Position of the `\r\n\r\n` that ends the message head, if present.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}

fn locate_head(buf: &[u8]) -> Result<usize, ParseError> {
    match find_headers_end(buf) {
        Some(end) if end > MAX_HEAD_SIZE => Err(ParseError::HeadTooLarge),
        Some(end) => Ok(end),
        None if buf.len() > MAX_HEAD_SIZE => Err(ParseError::HeadTooLarge),
        None => Err(ParseError::Incomplete),
    }
}

fn split_head(head: &[u8], bad_start: ParseError) -> Result<(&str, Headers), ParseError> {
    let head = std::str::from_utf8(head).map_err(|_| bad_start.clone())?;

    let mut lines = head.split("\r\n");
    let start_line = lines.next().ok_or(bad_start)?;

    let mut headers = Headers::new();
    for line in lines {
        let (key, value) = line
            .split_once(':')
            .ok_or(ParseError::InvalidHeader)?;

        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::InvalidHeader);
        }

        headers.append(key, value.trim());
    }

    Ok((start_line, headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.header("host"), Some("example.com"));
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn parse_redirect_head() {
        let resp = b"HTTP/1.1 301 Moved Permanently\r\nLocation: /result.html\r\nContent-Length: 0\r\n\r\n";

        let (head, consumed) = parse_response_head(resp).unwrap();

        assert_eq!(head.status, 301);
        assert_eq!(head.reason, "Moved Permanently");
        assert_eq!(head.headers.get("Location"), Some("/result.html"));
        assert_eq!(consumed, resp.len());
    }
}
