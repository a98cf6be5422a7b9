use serde::Deserialize;
use tracing::{info, warn};

use crate::validation::{ConfigReport, validate};
use crate::{GlobalConfig, HttpConfig, ServerConfig};

/// Prefix for environment overrides, e.g. `LUMEN_SERVER__PORT=9000`.
const ENV_PREFIX: &str = "LUMEN";

// =======================================================
// LUMEN CONFIG: main config
// =======================================================
#[derive(Debug, Deserialize, Clone)]
pub struct LumenConfig {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for LumenConfig {
    fn default() -> Self {
        let mut cfg = Self {
            global: GlobalConfig::default(),
            http: HttpConfig::default(),
            server: ServerConfig::default(),
        };
        cfg.apply_defaults();
        cfg
    }
}

impl LumenConfig {
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn http(&self) -> &HttpConfig {
        &self.http
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        validate(self)
    }

    /// Load `file_name` (INI, optional) layered under `LUMEN_*` environment variables.
    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Ini).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut cfg: LumenConfig = built.try_deserialize()?;

        cfg.apply_defaults();
        Ok(cfg)
    }

    pub fn from_file_or_default(file_name: &str) -> Self {
        match Self::from_file(file_name) {
            Ok(cfg) => {
                let report = cfg.validate();
                if report.has_errors() {
                    warn!(
                        target: "lumen::config",
                        file = %file_name,
                        report = %report.format(),
                        "Invalid config; using defaults"
                    );
                    LumenConfig::default()
                } else {
                    if !report.warnings().is_empty() {
                        warn!(
                            target: "lumen::config",
                            file = %file_name,
                            report = %report.format(),
                            "Config warnings"
                        );
                    }
                    cfg
                }
            }
            Err(e) => {
                warn!(
                    target: "lumen::config",
                    file = %file_name,
                    error = %e,
                    "Error reading config; using defaults"
                );
                LumenConfig::default()
            }
        }
    }

    fn apply_defaults(&mut self) {
        let def_global = GlobalConfig::default();
        self.global.apply_defaults_from(&def_global);

        let def_http = HttpConfig::default();
        self.http.apply_defaults_from(&def_http);

        let def_server = ServerConfig::default();
        self.server.apply_defaults_from(&def_server);
    }

    pub fn print(&self) {
        info!(
            target: "lumen::config",
            worker_connections = self.global.worker_connections,
            log_level = %self.global.log_level,
            "[global]"
        );
        info!(
            target: "lumen::config",
            keepalive_timeout_secs = self.http.keepalive_timeout_secs,
            client_read_timeout_secs = self.http.client_read_timeout_secs,
            max_request_headers_bytes = self.http.max_request_headers_bytes,
            cache_clear_interval_secs = self.http.cache_clear_interval_secs,
            shutdown_grace_secs = self.http.shutdown_grace_secs,
            "[http]"
        );
        info!(
            target: "lumen::config",
            listen = %self.server.listen,
            port = self.server.port,
            root = %self.server.root,
            index = %self.server.index,
            "[server]"
        );
    }
}
