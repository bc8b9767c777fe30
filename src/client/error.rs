//! Error types for the client.
//!
//! Transport errors mean the connection is gone or unusable; protocol errors
//! mean the server sent something that cannot be framed or followed. Both
//! end the current request only. A 404 is not an error.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::http::parser::ParseError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP connect failed or timed out.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer closed or reset the connection mid-exchange.
    ///
    /// `received` counts the response bytes seen before the close.
    #[error("connection closed by server after {received} response bytes")]
    Closed { received: usize },

    /// No response bytes arrived within the read timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("I/O error on connection: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    #[error("301 response without a Location header")]
    MissingLocation,

    #[error("unusable Location header {0:?}")]
    InvalidLocation(String),

    /// The final path has no usable last segment to name the output file.
    #[error("cannot derive a file name from {0:?}")]
    InvalidFileName(String),

    #[error("failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Connection-level failures, after which the connection is discarded.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Connect { .. }
                | ClientError::Closed { .. }
                | ClientError::Timeout(_)
                | ClientError::Io(_)
        )
    }

    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            ClientError::Protocol(_)
                | ClientError::MissingLocation
                | ClientError::InvalidLocation(_)
        )
    }

    /// True when a reused connection turned out to be dead before any part
    /// of the response was seen, so re-sending on a new one is safe.
    pub(crate) fn is_stale_connection(&self) -> bool {
        match self {
            ClientError::Closed { received } => *received == 0,
            ClientError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
