use http::StatusCode;
use tokio::time::Duration;
use tracing::info;

/// One line per answered request on `lumen::access`. The timestamp comes from
/// the subscriber.
pub(crate) fn log(method: &str, url: &str, status: StatusCode, elapsed: Duration) {
    let status = status.as_u16();
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    info!(
        target: "lumen::access",
        method,
        url,
        status,
        duration_ms,
        "{method} {url} - {status} - {duration_ms}ms"
    );
}
