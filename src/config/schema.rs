//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! daemon. All types derive Serde traits for deserialization from
//! config files, and every field has a default so minimal configs work.

use serde::{Deserialize, Serialize};

use crate::config::ports::{parse_ports, PortRangeError};
use crate::net::reconcile::{BindSpec, CLIENTS_KIND};
use crate::net::socket::Transport;

/// Root configuration for the daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DaemonConfig {
    /// Server identity.
    pub server: ServerConfig,

    /// Listener definitions; one entry may expand to many ports.
    pub bind: Vec<BindConfig>,

    /// Resource limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl DaemonConfig {
    /// Expand every bind entry into per-port listener specs.
    ///
    /// Entries without an explicit backlog inherit `limits.listen_backlog`.
    pub fn bind_specs(&self) -> Result<Vec<BindSpec>, PortRangeError> {
        let mut specs = Vec::new();
        for entry in &self.bind {
            specs.extend(entry.expand(self.limits.listen_backlog)?);
        }
        Ok(specs)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server name announced to clients.
    pub name: String,

    /// Network name this server belongs to.
    pub network: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "hearth.localdomain".to_string(),
            network: "LocalNet".to_string(),
        }
    }
}

/// One listener definition.
///
/// `ports` is a list grammar: `"6667"`, `"6660-6669"`, or a comma mix.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BindConfig {
    /// Address text to bind: an IP literal, or empty/`*` for all
    /// interfaces. Hostnames are not resolved.
    pub address: String,

    /// Ports to listen on, as a list/range string.
    pub ports: String,

    /// Stream (TCP) or datagram (UDP).
    pub transport: Transport,

    /// Listener class; only "clients" listeners are bound.
    #[serde(rename = "type")]
    pub kind: String,

    /// Pending-connection queue size; defaults to `limits.listen_backlog`.
    pub backlog: Option<i32>,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            ports: String::new(),
            transport: Transport::Stream,
            kind: CLIENTS_KIND.to_string(),
            backlog: None,
        }
    }
}

impl BindConfig {
    /// Expand this entry into one spec per port.
    pub fn expand(&self, default_backlog: i32) -> Result<Vec<BindSpec>, PortRangeError> {
        let backlog = self.backlog.unwrap_or(default_backlog);
        Ok(parse_ports(&self.ports)?
            .into_iter()
            .map(|port| {
                BindSpec::new(
                    self.address.clone(),
                    port,
                    self.transport,
                    backlog,
                    self.kind.clone(),
                )
            })
            .collect())
    }
}

/// Resource limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum concurrent client connections across all listeners.
    pub max_connections: usize,

    /// Default pending-connection queue size handed to listen(2).
    pub listen_backlog: i32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_connections: 10_000,
            listen_backlog: 128,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: DaemonConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.name, "hearth.localdomain");
        assert!(config.bind.is_empty());
        assert_eq!(config.limits.listen_backlog, 128);
        assert!(config.observability.metrics_enabled);
    }

    #[test]
    fn bind_entry_parses_with_type_keyword() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [[bind]]
            address = "*"
            ports = "6667"
            type = "clients"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind.len(), 1);
        assert_eq!(config.bind[0].address, "*");
        assert_eq!(config.bind[0].kind, "clients");
        assert_eq!(config.bind[0].transport, Transport::Stream);
    }

    #[test]
    fn bind_specs_expand_ranges_per_port() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [limits]
            listen_backlog = 64

            [[bind]]
            ports = "6667-6669"

            [[bind]]
            address = "127.0.0.1"
            ports = "7005"
            backlog = 16
            "#,
        )
        .unwrap();
        let specs = config.bind_specs().unwrap();
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[0].port, 6667);
        assert_eq!(specs[0].backlog, 64);
        assert_eq!(specs[3].address, "127.0.0.1");
        assert_eq!(specs[3].backlog, 16);
    }

    #[test]
    fn bad_port_list_surfaces_parse_error() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [[bind]]
            ports = "irc"
            "#,
        )
        .unwrap();
        assert!(config.bind_specs().is_err());
    }

    #[test]
    fn datagram_transport_deserializes() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [[bind]]
            ports = "7000"
            transport = "datagram"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind[0].transport, Transport::Datagram);
    }
}
