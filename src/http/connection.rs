use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};

use crate::http::parser::{ParseError, find_headers_end, parse_http_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::server::router::Router;

/// Server side of one client connection.
///
/// Requests are handled strictly one after another; the connection stays
/// open until the peer closes it, it sits idle past the idle timeout, or a
/// write fails.
pub struct Connection<S = TcpStream> {
    stream: S,
    buffer: Vec<u8>,
    state: ConnectionState,
    router: Arc<Router>,
    idle_timeout: Duration,
    served: u64,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    /// A request arrived but could not be parsed; answered with 404
    Rejecting(ParseError),
    Writing(ResponseWriter),
    Closed,
}

enum Incoming {
    Request(Request),
    Malformed(ParseError),
    /// Peer closed the connection between requests
    Eof,
    IdleTimeout,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Arc<Router>, idle_timeout: Duration) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(4096),
            state: ConnectionState::Reading,
            router,
            idle_timeout,
            served: 0,
        }
    }

    /// Number of responses written so far.
    pub fn served(&self) -> u64 {
        self.served
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        Incoming::Request(req) => ConnectionState::Processing(req),
                        Incoming::Malformed(e) => ConnectionState::Rejecting(e),
                        Incoming::Eof => ConnectionState::Closed,
                        Incoming::IdleTimeout => {
                            tracing::debug!(
                                idle_ms = self.idle_timeout.as_millis() as u64,
                                served = self.served,
                                "Closing idle connection"
                            );
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Processing(req) => {
                    let response = self.router.respond(&req.path).await;

                    tracing::info!(
                        method = ?req.method,
                        path = %req.path,
                        status = response.status.as_u16(),
                        "Request handled"
                    );

                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Rejecting(e) => {
                    tracing::info!(error = %e, status = 404, "Malformed request");
                    self.state =
                        ConnectionState::Writing(ResponseWriter::new(&Response::not_found()));
                }

                ConnectionState::Writing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.served += 1;
                    self.state = ConnectionState::Reading; // go back for next request
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Waits for the next request, at most `idle_timeout` from now.
    async fn read_request(&mut self) -> anyhow::Result<Incoming> {
        let deadline = Instant::now() + self.idle_timeout;

        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.drain(..consumed);
                    return Ok(Incoming::Request(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(ParseError::HeadTooLarge) => {
                    // No way to find the next request boundary.
                    self.buffer.clear();
                    return Ok(Incoming::Malformed(ParseError::HeadTooLarge));
                }

                Err(e) => {
                    // Skip the offending head; the connection stays usable.
                    let consumed = find_headers_end(&self.buffer)
                        .map(|end| end + 4)
                        .unwrap_or(self.buffer.len());
                    self.buffer.drain(..consumed);
                    return Ok(Incoming::Malformed(e));
                }
            }

            let mut temp = [0u8; 4096];
            let n = match timeout_at(deadline, self.stream.read(&mut temp)).await {
                Ok(read) => read?,
                Err(_) => return Ok(Incoming::IdleTimeout),
            };

            if n == 0 {
                if !self.buffer.is_empty() {
                    tracing::debug!(
                        pending = self.buffer.len(),
                        "Peer closed with a partial request"
                    );
                }
                return Ok(Incoming::Eof);
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }
}
