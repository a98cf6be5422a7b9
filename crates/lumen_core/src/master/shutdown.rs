use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Resolves on the first SIGINT (Ctrl+C) or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires, so the
/// other signal still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(target: "lumen::master", error = ?e, "Failed to register SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(target: "lumen::master", error = ?e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(target: "lumen::master", signal = "SIGINT", "Shutdown signal received"),
        _ = terminate => info!(target: "lumen::master", signal = "SIGTERM", "Shutdown signal received"),
    }
}

/// Wait for every tracked connection task. A zero `grace` waits without limit.
pub(super) async fn drain(tracker: TaskTracker, grace: Duration) {
    tracker.close();

    info!(
        target: "lumen::master",
        in_flight = tracker.len(),
        grace_secs = grace.as_secs(),
        "Draining connections"
    );

    if grace.is_zero() {
        tracker.wait().await;
        return;
    }

    if timeout(grace, tracker.wait()).await.is_err() {
        warn!(
            target: "lumen::master",
            remaining = tracker.len(),
            grace_secs = grace.as_secs(),
            "Grace period elapsed; abandoning remaining connections"
        );
    }
}
