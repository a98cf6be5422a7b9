use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::Deserialize;

// =======================================================
// SERVER CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    pub port: u16,
    pub root: String,
    pub index: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0".into(),
            port: 8000,
            root: ".".into(),
            index: "index.html".into(),
        }
    }
}

impl ServerConfig {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Socket address to bind. An unparsable host falls back to all interfaces.
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self
            .listen
            .parse::<IpAddr>()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.port)
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &ServerConfig) {
        if self.listen.is_empty() {
            self.listen = defaults.listen.clone();
        }
        if self.root.is_empty() {
            self.root = defaults.root.clone();
        }
        if self.index.is_empty() {
            self.index = defaults.index.clone();
        }
    }
}
