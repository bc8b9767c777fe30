//! Client side of the file-retrieval protocol.
//!
//! # Architecture
//!
//! - **`connection`**: owns the one TCP connection and its read buffer
//! - **`encoder`**: turns a path into GET request bytes
//! - **`response`**: frames one response off the connection
//! - **`redirect`**: turns a `Location` into the next path
//! - **`persist`**: writes successful bodies to disk
//! - **`error`**: transport / protocol / local error taxonomy
//!
//! `Client` drives them: one request in flight at a time, at most one
//! redirect hop per fetch.

pub mod connection;
pub mod encoder;
pub mod error;
pub mod persist;
pub mod redirect;
pub mod response;

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ClientConfig;

pub use connection::{Connection, ConnectionManager};
pub use error::ClientError;
pub use response::ReceivedResponse;

use encoder::encode_get;
use persist::persist_body;
use redirect::resolve_location;
use response::read_response;

/// Result of fetching one operator path.
#[derive(Debug)]
pub struct Fetch {
    /// Responses in arrival order: one, or two when a redirect was followed
    pub responses: Vec<ReceivedResponse>,
    /// File written for a final 200, if any
    pub saved: Option<PathBuf>,
}

impl Fetch {
    pub fn final_response(&self) -> Option<&ReceivedResponse> {
        self.responses.last()
    }

    pub fn status_lines(&self) -> Vec<String> {
        self.responses.iter().map(ReceivedResponse::status_line).collect()
    }
}

pub struct Client {
    manager: ConnectionManager,
    read_timeout: Duration,
    output_dir: PathBuf,
}

impl Client {
    pub fn new(host: impl Into<String>, port: u16, cfg: &ClientConfig) -> Self {
        Self {
            manager: ConnectionManager::new(host, port, cfg.connect_timeout()),
            read_timeout: cfg.read_timeout(),
            output_dir: cfg.output_dir.clone(),
        }
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Fetches `path`, following a single 301, and saves a final 200 body.
    pub async fn fetch(&mut self, path: &str) -> Result<Fetch, ClientError> {
        self.fetch_with(path, |_| {}).await
    }

    /// Like [`Client::fetch`], calling `on_response` for every response as
    /// soon as it is framed, so a 301 is reported even if following it fails.
    pub async fn fetch_with<F>(&mut self, path: &str, mut on_response: F) -> Result<Fetch, ClientError>
    where
        F: FnMut(&ReceivedResponse),
    {
        let first = self.exchange(path).await?;
        on_response(&first);

        let mut final_path = path.to_string();
        let mut responses = vec![first];

        if responses[0].is_redirect() {
            let location = responses[0]
                .location()
                .ok_or(ClientError::MissingLocation)?;
            let target = resolve_location(location)?;

            tracing::debug!(from = %path, to = %target, "Following redirect");

            // One hop only: whatever answers the follow-up is final.
            let second = self.exchange(&target).await?;
            on_response(&second);

            final_path = target;
            responses.push(second);
        }

        let mut saved = None;
        if let Some(last) = responses.last().filter(|r| r.is_success()) {
            saved = Some(persist_body(&self.output_dir, &final_path, &last.body).await?);
        }

        Ok(Fetch { responses, saved })
    }

    /// One request/response cycle. A reused connection that turns out to be
    /// closed before any response byte arrived is replaced and the request
    /// re-sent once.
    async fn exchange(&mut self, path: &str) -> Result<ReceivedResponse, ClientError> {
        let request = encode_get(path, &self.manager.host_header());

        let (result, reused) = self.attempt(&request).await;
        match result {
            Err(e) if reused && e.is_stale_connection() => {
                tracing::debug!(path = %path, error = %e, "Stale connection, retrying on a new one");
                self.attempt(&request).await.0
            }
            other => other,
        }
    }

    async fn attempt(&mut self, request: &[u8]) -> (Result<ReceivedResponse, ClientError>, bool) {
        let read_timeout = self.read_timeout;

        let conn = match self.manager.ensure_connected().await {
            Ok(conn) => conn,
            Err(e) => return (Err(e), false),
        };
        let reused = conn.exchanges() > 0;

        let result = match conn.send(request).await {
            Ok(()) => read_response(conn, read_timeout).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::debug!(error = %e, "Exchange failed, dropping connection");
            self.manager.disconnect();
        }

        (result, reused)
    }
}
