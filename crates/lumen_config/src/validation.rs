use std::path::Path;

use crate::LumenConfig;

/// Validation output for a loaded Lumen configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true when at least one error was found.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the collected warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Render warnings and errors into a readable, multi-line string.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for err in &self.errors {
                out.push_str("  - ");
                out.push_str(err);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Warnings:\n");
            for warn in &self.warnings {
                out.push_str("  - ");
                out.push_str(warn);
                out.push('\n');
            }
        }
        out
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validate a Lumen configuration and return a report of issues.
pub fn validate(cfg: &LumenConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_http(cfg, &mut report);
    validate_server(cfg, &mut report);

    report
}

fn validate_http(cfg: &LumenConfig, report: &mut ConfigReport) {
    if cfg.http.cache_clear_interval_secs == 0 {
        report.warn("http.cache_clear_interval_secs is 0; the content cache is never cleared");
    }
}

fn validate_server(cfg: &LumenConfig, report: &mut ConfigReport) {
    let server = &cfg.server;

    if server.port == 0 {
        report.error("server.port must not be 0");
    }

    if server.listen.parse::<std::net::IpAddr>().is_err() {
        report.warn(format!(
            "server.listen '{listen}' is not an IP address; binding all interfaces",
            listen = server.listen
        ));
    }

    if server.root.trim().is_empty() {
        report.error("server.root is empty");
    } else {
        let root = Path::new(&server.root);
        if !root.exists() {
            report.warn(format!(
                "server.root '{root}' does not exist",
                root = server.root
            ));
        } else if !root.is_dir() {
            report.error(format!(
                "server.root '{root}' is not a directory",
                root = server.root
            ));
        }
    }

    if server.index.trim().is_empty() {
        report.error("server.index is empty");
    } else if server.index.contains('/') || server.index.contains('\\') || server.index == ".." {
        report.error(format!(
            "server.index '{index}' must be a plain file name",
            index = server.index
        ));
    }
}
