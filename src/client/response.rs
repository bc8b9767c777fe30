use std::time::Duration;

use bytes::Bytes;

use crate::client::connection::Connection;
use crate::client::error::ClientError;
use crate::http::headers::Headers;
use crate::http::parser::{ParseError, parse_response_head};

/// A response as received by the client.
#[derive(Debug, Clone)]
pub struct ReceivedResponse {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
    /// Exactly `Content-Length` bytes
    pub body: Bytes,
}

impl ReceivedResponse {
    /// The status line as it appeared on the wire, without CRLF.
    pub fn status_line(&self) -> String {
        let line = format!("{} {} {}", self.version, self.status, self.reason);
        line.trim_end().to_string()
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub fn is_redirect(&self) -> bool {
        self.status == 301
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get("Location")
    }
}

/// Reads one complete response from `conn`.
///
/// The body is framed by `Content-Length` only and nothing past it is
/// consumed. Bytes that follow stay buffered on the connection, which then
/// fails the reuse check. Every wait for data is bounded by `read_timeout`.
pub async fn read_response(
    conn: &mut Connection,
    read_timeout: Duration,
) -> Result<ReceivedResponse, ClientError> {
    let (head, head_len) = loop {
        match parse_response_head(conn.buffered()) {
            Ok(parsed) => break parsed,
            Err(ParseError::Incomplete) => {}
            Err(e) => return Err(e.into()),
        }

        if conn.fill(read_timeout).await? == 0 {
            return Err(ClientError::Closed {
                received: conn.buffered().len(),
            });
        }
    };

    let content_length = head
        .headers
        .content_length()?
        .ok_or(ParseError::MissingContentLength)?;

    let total = head_len
        .checked_add(content_length)
        .ok_or(ParseError::InvalidContentLength)?;

    // The whole message stays buffered until complete, so a failure part way
    // through still reports every byte received.
    conn.receive_until(total, read_timeout).await?;

    let mut message = conn.take(total);
    let body = message.split_off(head_len);
    conn.finish_exchange();

    tracing::trace!(
        status = head.status,
        body_len = body.len(),
        leftover = conn.buffered().len(),
        "Response framed"
    );

    Ok(ReceivedResponse {
        version: head.version,
        status: head.status,
        reason: head.reason,
        headers: head.headers,
        body,
    })
}
