//! HTTP/1.1 wire helpers used by the connection worker.

pub mod response;
pub mod responses;

pub use response::{encode_response, write_response};
