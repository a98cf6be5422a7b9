use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the epoch; times before it count as zero.
pub fn epoch_millis(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .map(|dur| dur.as_millis())
        .unwrap_or(0)
}

/// Quoted `"<mtime millis>-<length>"` validator.
///
/// Not a content hash: a same-sized rewrite within the same millisecond keeps
/// the tag.
pub fn entity_tag(last_modified: SystemTime, len: usize) -> String {
    format!("\"{}-{}\"", epoch_millis(last_modified), len)
}

pub fn last_modified_header(last_modified: SystemTime) -> String {
    httpdate::fmt_http_date(last_modified.max(UNIX_EPOCH)) // -> RFC1123 in GMT
}

/// Drop sub-millisecond precision so comparisons match the ETag's clock.
pub(crate) fn truncate_to_millis(time: SystemTime) -> SystemTime {
    let millis = epoch_millis(time);
    UNIX_EPOCH + Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}
