use std::time::SystemTime;

use bytes::Bytes;

/// Snapshot of a file as it was on disk when first read.
///
/// Cloning is cheap: `data` is reference counted, so a request that grabbed
/// an entry keeps serving it even if the store is cleared meanwhile.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub data: Bytes,
    pub last_modified: SystemTime,
}

impl CacheEntry {
    pub fn new(data: Bytes, last_modified: SystemTime) -> Self {
        Self {
            data,
            last_modified,
        }
    }
}
