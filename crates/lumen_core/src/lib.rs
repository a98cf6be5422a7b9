//! Process orchestration for the asset server.
//!
//! The master owns the listener, the connection limit, the content cache
//! sweeper and shutdown. Each accepted connection is driven by a worker task
//! that reads HTTP/1.1 requests and hands them to the static service.

pub mod master;
pub mod worker;

pub use master::{Master, shutdown_signal};
