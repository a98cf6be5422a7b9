use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use bytes::Bytes;
use tracing::debug;

use crate::entry::CacheEntry;

/// Process-wide file content cache keyed by resolved absolute path.
///
/// There is no per-entry expiry: entries live until [`ContentCache::clear`]
/// swaps the whole map for an empty one.
#[derive(Debug, Default)]
pub struct ContentCache {
    inner: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<CacheEntry> {
        let entry = self.read().get(path).cloned();
        debug!(
            target: "lumen::cache",
            path = %path.display(),
            hit = entry.is_some(),
            "Cache lookup"
        );
        entry
    }

    /// Insert or overwrite the entry for `path`.
    pub fn put(&self, path: PathBuf, data: Bytes, last_modified: SystemTime) {
        let entry = CacheEntry::new(data, last_modified);
        debug!(
            target: "lumen::cache",
            path = %path.display(),
            bytes = entry.data.len(),
            "Cache store"
        );
        self.write().insert(path, entry);
    }

    /// Drop every entry at once and return how many were evicted.
    pub fn clear(&self) -> usize {
        let old = std::mem::take(&mut *self.write());
        old.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use bytes::Bytes;

    use super::ContentCache;

    fn ts(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn get_returns_what_was_put() {
        let cache = ContentCache::new();
        cache.put(PathBuf::from("/www/app.css"), Bytes::from_static(b"body{}"), ts(10));

        let entry = cache.get(Path::new("/www/app.css")).expect("entry");
        assert_eq!(entry.data, Bytes::from_static(b"body{}"));
        assert_eq!(entry.last_modified, ts(10));
        assert!(cache.get(Path::new("/www/other.css")).is_none());
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let cache = ContentCache::new();
        cache.put(PathBuf::from("/www/a.js"), Bytes::from_static(b"one"), ts(1));
        cache.put(PathBuf::from("/www/a.js"), Bytes::from_static(b"two"), ts(2));

        let entry = cache.get(Path::new("/www/a.js")).expect("entry");
        assert_eq!(entry.data, Bytes::from_static(b"two"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_everything_and_reports_count() {
        let cache = ContentCache::new();
        cache.put(PathBuf::from("/www/a.png"), Bytes::from_static(b"a"), ts(1));
        cache.put(PathBuf::from("/www/b.png"), Bytes::from_static(b"b"), ts(1));

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.clear(), 0);
    }

    #[test]
    fn snapshot_survives_clear() {
        let cache = ContentCache::new();
        cache.put(PathBuf::from("/www/logo.svg"), Bytes::from_static(b"<svg/>"), ts(5));

        let held = cache.get(Path::new("/www/logo.svg")).expect("entry");
        cache.clear();

        assert_eq!(held.data, Bytes::from_static(b"<svg/>"));
        assert!(cache.get(Path::new("/www/logo.svg")).is_none());
    }

    #[test]
    fn concurrent_put_and_clear_do_not_corrupt() {
        let cache = Arc::new(ContentCache::new());
        let mut handles = Vec::new();

        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..200 {
                    let path = PathBuf::from(format!("/www/{t}/{i}.css"));
                    cache.put(path.clone(), Bytes::from(format!("{t}-{i}")), ts(i));
                    if let Some(entry) = cache.get(&path) {
                        assert_eq!(entry.data, Bytes::from(format!("{t}-{i}")));
                    }
                    if i % 50 == 0 {
                        cache.clear();
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker thread");
        }
        assert!(cache.len() <= 4 * 200);
    }
}
