//! Connection management
//!
//! The client talks to the server over a single TCP connection at a time.
//! `ConnectionManager` owns it: it opens the connection lazily, probes a
//! kept connection before reusing it, and drops it when an exchange fails.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};

use crate::client::error::ClientError;

/// Initial capacity of the read buffer
const BUFFER_SIZE: usize = 8192;

/// Cap on up-front allocation for a body of announced length
const MAX_PREALLOC: usize = 8 * 1024 * 1024;

/// How long a liveness probe waits for a close notification before the
/// connection is considered open.
const LIVENESS_PROBE: Duration = Duration::from_millis(2);

/// An open connection to the server plus the bytes read from it that have
/// not yet been consumed as part of a response.
pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    opened_at: Instant,
    last_activity: Instant,
    exchanges: u64,
}

impl Connection {
    fn new(stream: TcpStream) -> Self {
        let now = Instant::now();
        Self {
            stream,
            buffer: BytesMut::with_capacity(BUFFER_SIZE),
            opened_at: now,
            last_activity: now,
            exchanges: 0,
        }
    }

    /// Writes a whole request.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        self.last_activity = Instant::now();
        Ok(())
    }

    /// Reads whatever the socket has into the buffer, waiting at most
    /// `read_timeout`. Returns the number of new bytes; 0 means EOF.
    pub async fn fill(&mut self, read_timeout: Duration) -> Result<usize, ClientError> {
        let n = match timeout(read_timeout, self.stream.read_buf(&mut self.buffer)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) if is_reset(&e) => {
                return Err(ClientError::Closed {
                    received: self.buffer.len(),
                });
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(ClientError::Timeout(read_timeout)),
        };

        if n > 0 {
            self.last_activity = Instant::now();
        }

        Ok(n)
    }

    /// Reads until at least `n` bytes are buffered.
    pub async fn receive_until(&mut self, n: usize, read_timeout: Duration) -> Result<(), ClientError> {
        if n > self.buffer.len() {
            self.buffer.reserve((n - self.buffer.len()).min(MAX_PREALLOC));
        }

        while self.buffer.len() < n {
            if self.fill(read_timeout).await? == 0 {
                return Err(ClientError::Closed {
                    received: self.buffer.len(),
                });
            }
        }

        Ok(())
    }

    /// Unconsumed bytes, starting at the current message.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Removes the first `n` buffered bytes; anything after them stays.
    pub fn take(&mut self, n: usize) -> Bytes {
        self.buffer.split_to(n).freeze()
    }

    pub(crate) fn finish_exchange(&mut self) {
        self.exchanges += 1;
    }

    /// Completed request/response exchanges on this connection.
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Whether the connection can carry another request.
    ///
    /// Only one request is ever in flight, so before a new one is sent the
    /// stream must be quiet: EOF, an error, or any byte the server sent
    /// unasked (buffered or still in the socket) disqualifies it.
    async fn is_reusable(&self) -> bool {
        if !self.buffer.is_empty() {
            tracing::warn!(
                discarded = self.buffer.len(),
                "Unsolicited bytes buffered, dropping connection"
            );
            return false;
        }

        let mut probe = [0u8; 1];
        match timeout(LIVENESS_PROBE, self.stream.peek(&mut probe)).await {
            // Nothing to read yet: still open
            Err(_) => true,
            Ok(Ok(0)) => false,
            Ok(Ok(_)) => {
                tracing::warn!("Unsolicited bytes pending, dropping connection");
                false
            }
            Ok(Err(_)) => false,
        }
    }
}

fn is_reset(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
    )
}

/// Owns the client's connection to `host:port`.
pub struct ConnectionManager {
    host: String,
    port: u16,
    connect_timeout: Duration,
    conn: Option<Connection>,
    opened: u64,
}

impl ConnectionManager {
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
            conn: None,
            opened: 0,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value for the `Host` header.
    pub fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            self.addr()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Number of TCP connections opened so far.
    pub fn connections_opened(&self) -> u64 {
        self.opened
    }

    /// Returns a usable connection, opening a new one if there is none or
    /// the current one was closed or sent bytes nobody asked for.
    pub async fn ensure_connected(&mut self) -> Result<&mut Connection, ClientError> {
        let conn = match self.conn.take() {
            Some(conn) => {
                if conn.is_reusable().await {
                    conn
                } else {
                    tracing::debug!(
                        exchanges = conn.exchanges(),
                        idle_ms = conn.idle_for().as_millis() as u64,
                        "Connection not reusable, reconnecting"
                    );
                    self.connect().await?
                }
            }
            None => self.connect().await?,
        };

        Ok(self.conn.insert(conn))
    }

    /// Drops the current connection, if any.
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::debug!(
                exchanges = conn.exchanges(),
                lifetime_ms = conn.opened_at().elapsed().as_millis() as u64,
                "Connection dropped"
            );
        }
    }

    async fn connect(&mut self) -> Result<Connection, ClientError> {
        let addr = self.addr();

        let stream = match timeout(self.connect_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(ClientError::Connect { addr, source }),
            Err(_) => {
                return Err(ClientError::Connect {
                    addr,
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "connect timed out",
                    ),
                });
            }
        };

        // Requests are small and sent whole; don't let Nagle delay them.
        stream.set_nodelay(true)?;

        self.opened += 1;
        tracing::info!(addr = %addr, connections = self.opened, "Connected to server");

        Ok(Connection::new(stream))
    }
}
