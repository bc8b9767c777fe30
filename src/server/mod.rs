//! Server side: the accept loop and the route table.

pub mod listener;
pub mod router;

pub use router::{Route, Router};
