//! HTTP protocol implementation.
//!
//! The subset of HTTP/1.1 spoken between the ferry client and server: GET
//! requests, `200`/`301`/`404` responses, bodies framed by `Content-Length`,
//! connections kept open across requests.
//!
//! # Architecture
//!
//! - **`connection`**: The server's per-connection request-response state machine
//! - **`parser`**: Parses requests and response heads from byte buffers
//! - **`headers`**: Ordered, case-insensitive header fields
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes requests and responses onto a stream
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! Each accepted connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for the next request (idle timer armed)
//!        └──────┬──────┘
//!               │ Request received        │ Malformed
//!               ▼                         ▼
//!        ┌──────────────────┐   ┌──────────────────┐
//!        │   Processing     │   │    Rejecting     │ ← 404
//!        └──────┬───────────┘   └──────┬───────────┘
//!               │ Response ready        │
//!               ▼                       ▼
//!        ┌──────────────────────────────────┐
//!        │             Writing              │
//!        └──────┬───────────────────────────┘
//!               │ Response sent
//!               └─ → Reading (same connection)
//!
//!   Reading ── peer EOF / idle timeout ──→ Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ferry::http::connection::Connection;
//! use ferry::server::Router;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let router = Arc::new(Router::new("files", "index.html", Default::default())?);
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let router = Arc::clone(&router);
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, router, Duration::from_secs(1));
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
