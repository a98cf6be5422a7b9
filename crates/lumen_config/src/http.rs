use serde::Deserialize;

// =======================================================
// HTTP CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub keepalive_timeout_secs: u64,

    // Timeouts (seconds)
    pub client_read_timeout_secs: u64,

    // Limits (bytes)
    pub max_request_headers_bytes: u64,

    // Content cache
    /// Interval between full clears of the in-memory content cache.
    /// `0` disables the sweeper.
    pub cache_clear_interval_secs: u64,

    // Shutdown
    /// Upper bound for draining in-flight connections after a signal.
    /// `0` waits for every connection to finish.
    pub shutdown_grace_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            keepalive_timeout_secs: 65,
            client_read_timeout_secs: 15,
            max_request_headers_bytes: 64 * 1024,
            cache_clear_interval_secs: 3600,
            shutdown_grace_secs: 0,
        }
    }
}

impl HttpConfig {
    pub fn keepalive_timeout_secs(&self) -> u64 {
        self.keepalive_timeout_secs
    }

    pub fn client_read_timeout_secs(&self) -> u64 {
        self.client_read_timeout_secs
    }

    pub fn max_request_headers_bytes(&self) -> u64 {
        self.max_request_headers_bytes
    }

    pub fn cache_clear_interval_secs(&self) -> u64 {
        self.cache_clear_interval_secs
    }

    pub fn shutdown_grace_secs(&self) -> u64 {
        self.shutdown_grace_secs
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &HttpConfig) {
        if self.keepalive_timeout_secs == 0 {
            self.keepalive_timeout_secs = defaults.keepalive_timeout_secs;
        }
        if self.client_read_timeout_secs == 0 {
            self.client_read_timeout_secs = defaults.client_read_timeout_secs;
        }
        if self.max_request_headers_bytes == 0 {
            self.max_request_headers_bytes = defaults.max_request_headers_bytes;
        }
    }
}
