use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber: compact lines on stdout.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (the configured
/// `global.log_level`) applies to everything.
pub fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .compact()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_thread_ids(false),
        )
        .init();
}
