//! Extension → (content type, max-age) table.

use std::collections::HashMap;

/// Content type and `Cache-Control: max-age` for one file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeEntry {
    pub content_type: &'static str,
    pub cache_seconds: u32,
}

impl MimeEntry {
    const fn new(content_type: &'static str, cache_seconds: u32) -> Self {
        Self {
            content_type,
            cache_seconds,
        }
    }
}

const MINUTES_5: u32 = 300;
const HOUR: u32 = 3600;
const DAY: u32 = 86_400;
const WEEK: u32 = 7 * DAY;
const DAYS_30: u32 = 30 * DAY;

pub const DEFAULT_ENTRY: MimeEntry = MimeEntry::new("text/plain", 0);

const TABLE: &[(&str, MimeEntry)] = &[
    (".html", MimeEntry::new("text/html; charset=utf-8", MINUTES_5)),
    (".css", MimeEntry::new("text/css; charset=utf-8", DAY)),
    (".js", MimeEntry::new("text/javascript; charset=utf-8", DAY)),
    (".png", MimeEntry::new("image/png", WEEK)),
    (".jpg", MimeEntry::new("image/jpeg", WEEK)),
    (".jpeg", MimeEntry::new("image/jpeg", WEEK)),
    (".webp", MimeEntry::new("image/webp", WEEK)),
    (".gif", MimeEntry::new("image/gif", WEEK)),
    (".svg", MimeEntry::new("image/svg+xml", WEEK)),
    (".ico", MimeEntry::new("image/x-icon", DAYS_30)),
    (".json", MimeEntry::new("application/json", HOUR)),
    (".woff", MimeEntry::new("font/woff", DAYS_30)),
    (".woff2", MimeEntry::new("font/woff2", DAYS_30)),
];

/// Immutable lookup table, built once when the service starts.
#[derive(Debug, Clone)]
pub struct MimeRegistry {
    entries: HashMap<&'static str, MimeEntry>,
}

impl Default for MimeRegistry {
    fn default() -> Self {
        Self {
            entries: TABLE.iter().copied().collect(),
        }
    }
}

impl MimeRegistry {
    /// `extension` is lowercase with its leading dot, e.g. `".css"`.
    pub fn lookup(&self, extension: &str) -> &MimeEntry {
        self.entries.get(extension).unwrap_or(&DEFAULT_ENTRY)
    }
}
