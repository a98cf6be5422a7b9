//! Configuration model for the lumen asset server.
//!
//! Settings come from an optional INI file layered under `LUMEN_*`
//! environment variables; anything left unset takes the defaults below.

mod global;
mod http;
mod lumen;
mod server;
mod validation;

pub use global::GlobalConfig;
pub use http::HttpConfig;
pub use lumen::LumenConfig;
pub use server::ServerConfig;
pub use validation::{ConfigReport, validate};
