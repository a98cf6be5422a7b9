/// Extension (with leading dot) of documents that are always read fresh.
const HTML_EXTENSION: &str = ".html";

pub struct CachePolicy;

impl CachePolicy {
    /// Page markup changes often during editing; everything else is kept
    /// until the next full clear.
    pub fn is_cacheable(extension: &str) -> bool {
        !extension.eq_ignore_ascii_case(HTML_EXTENSION)
    }
}
