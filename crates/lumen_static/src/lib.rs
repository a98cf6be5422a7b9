//! Static asset serving.
//!
//! [`StaticService`] turns a request into a response in a fixed sequence:
//! resolve the URL inside the document root, load the bytes (content cache
//! first, then disk), answer `304` when the client's validators still hold,
//! otherwise negotiate gzip/deflate and emit `200` with caching and security
//! headers. Errors never escape [`StaticService::handle`]; they become `403`,
//! `404` or `500` pages.

pub mod compression;
pub mod conditional;
mod error;
pub mod etag;
mod fs;
pub mod mime;
mod response;
mod service;

pub use error::StaticError;
pub use fs::{PathResolver, ResolvedPath};
pub use mime::{MimeEntry, MimeRegistry};
pub use service::StaticService;
