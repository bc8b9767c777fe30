//! Ferry - file retrieval over one persistent HTTP/1.1 connection
//!
//! Core library for the client driver and the file server it talks to.

pub mod client;
pub mod config;
pub mod http;
pub mod server;
