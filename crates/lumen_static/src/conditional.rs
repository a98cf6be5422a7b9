use std::time::SystemTime;

use http::HeaderMap;
use http::header::{HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH};

use crate::etag::truncate_to_millis;

/// Cache validators sent by the client.
#[derive(Debug, Default, Clone)]
pub struct Validators {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

impl Validators {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        Self {
            if_none_match: get(IF_NONE_MATCH),
            if_modified_since: get(IF_MODIFIED_SINCE),
        }
    }

    /// Whether the client's copy is still good.
    ///
    /// A matching `If-None-Match` wins. Otherwise a parseable
    /// `If-Modified-Since` at or after the file's mtime also counts, even when
    /// an `If-None-Match` was sent and did not match.
    pub fn not_modified(&self, etag: &str, last_modified: SystemTime) -> bool {
        if self.if_none_match.as_deref() == Some(etag) {
            return true;
        }

        let Some(since) = self.if_modified_since.as_deref() else {
            return false;
        };
        match httpdate::parse_http_date(since.trim()) {
            Ok(since) => since >= truncate_to_millis(last_modified),
            Err(_) => false,
        }
    }
}
