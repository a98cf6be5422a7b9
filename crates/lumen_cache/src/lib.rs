//! In-memory content cache for the static service.

mod entry;
mod policy;
mod store;

pub use entry::CacheEntry;
pub use policy::CachePolicy;
pub use store::ContentCache;
