//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check address literals without touching the network
//! - Validate value ranges (ports, backlogs, limits)
//! - Detect duplicate listeners before any bind is attempted
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure check: DaemonConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, so a rehash with a
//!   broken config never reaches the reconciler

use std::collections::BTreeSet;

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::ports::parse_ports;
use crate::config::schema::DaemonConfig;
use crate::net::address;

/// IPv4-mapped IPv6 prefix; binding these works but confuses address
/// matching downstream, so it draws a warning.
const MAPPED_V4_PREFIX: &str = "::ffff:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("bind entry {entry}: invalid address {address:?}: {detail}")]
    BadAddress {
        entry: usize,
        address: String,
        detail: String,
    },

    #[error("bind entry {entry}: invalid port list {ports:?}: {detail}")]
    BadPorts {
        entry: usize,
        ports: String,
        detail: String,
    },

    #[error("bind entry {entry}: listener type must not be empty")]
    BlankKind { entry: usize },

    #[error("bind entry {entry}: backlog must be positive, got {backlog}")]
    BadBacklog { entry: usize, backlog: i32 },

    #[error("duplicate listener {address}:{port} for type {kind:?}")]
    DuplicateBind {
        address: String,
        port: u16,
        kind: String,
    },

    #[error("limits.{field} must be positive")]
    BadLimit { field: &'static str },

    #[error("limits.{field} must not exceed {max}")]
    LimitTooLarge { field: &'static str, max: usize },

    #[error("invalid metrics address {address:?}")]
    BadMetricsAddress { address: String },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &DaemonConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen: BTreeSet<(String, u16, String)> = BTreeSet::new();

    for (entry, bind) in config.bind.iter().enumerate() {
        let normalized = address::normalize(&bind.address).to_string();

        if !normalized.is_empty() {
            if normalized.starts_with(MAPPED_V4_PREFIX) {
                tracing::warn!(
                    address = %bind.address,
                    "Binding a 4in6 (::ffff:) address is not recommended, bind the IPv4 address directly instead"
                );
            }
            if let Err(err) = address::parse(&normalized, 0) {
                errors.push(ValidationError::BadAddress {
                    entry,
                    address: bind.address.clone(),
                    detail: err.to_string(),
                });
            }
        }

        if bind.kind.is_empty() {
            errors.push(ValidationError::BlankKind { entry });
        }

        if let Some(backlog) = bind.backlog {
            if backlog <= 0 {
                errors.push(ValidationError::BadBacklog { entry, backlog });
            }
        }

        match parse_ports(&bind.ports) {
            Ok(ports) => {
                for port in ports {
                    let key = (normalized.clone(), port, bind.kind.clone());
                    if !seen.insert(key) {
                        errors.push(ValidationError::DuplicateBind {
                            address: if normalized.is_empty() {
                                address::WILDCARD_MARKER.to_string()
                            } else {
                                normalized.clone()
                            },
                            port,
                            kind: bind.kind.clone(),
                        });
                    }
                }
            }
            Err(err) => {
                errors.push(ValidationError::BadPorts {
                    entry,
                    ports: bind.ports.clone(),
                    detail: err.to_string(),
                });
            }
        }
    }

    if config.limits.max_connections == 0 {
        errors.push(ValidationError::BadLimit {
            field: "max_connections",
        });
    } else if config.limits.max_connections > Semaphore::MAX_PERMITS {
        // The accept semaphore cannot grant more permits than this.
        errors.push(ValidationError::LimitTooLarge {
            field: "max_connections",
            max: Semaphore::MAX_PERMITS,
        });
    }
    if config.limits.listen_backlog <= 0 {
        errors.push(ValidationError::BadLimit {
            field: "listen_backlog",
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::BadMetricsAddress {
            address: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(source: &str) -> DaemonConfig {
        toml::from_str(source).unwrap()
    }

    #[test]
    fn accepts_typical_config() {
        let config = config_from(
            r#"
            [[bind]]
            address = "*"
            ports = "6667,6697"

            [[bind]]
            address = "127.0.0.1"
            ports = "7005"
            "#,
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn accepts_empty_bind_list() {
        // A config with no listeners loads fine; the daemon just has
        // nothing to serve until the next rehash.
        assert!(validate_config(&config_from("")).is_ok());
    }

    #[test]
    fn rejects_duplicate_across_entries() {
        let config = config_from(
            r#"
            [[bind]]
            address = "*"
            ports = "6667"

            [[bind]]
            ports = "6665-6668"
            "#,
        );
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|err| matches!(
            err,
            ValidationError::DuplicateBind { port: 6667, .. }
        )));
    }

    #[test]
    fn same_port_different_kind_is_not_duplicate() {
        let config = config_from(
            r#"
            [[bind]]
            ports = "7001"
            type = "clients"

            [[bind]]
            ports = "7001"
            type = "servers"
            "#,
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_unparseable_address() {
        let config = config_from(
            r#"
            [[bind]]
            address = "irc.example.net"
            ports = "6667"
            "#,
        );
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::BadAddress { .. }));
    }

    #[test]
    fn collects_every_error() {
        let config = config_from(
            r#"
            [limits]
            listen_backlog = 0

            [[bind]]
            address = "not-an-ip"
            ports = "0"

            [[bind]]
            ports = "6667"
            type = ""
            "#,
        );
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 4);
    }

    #[test]
    fn rejects_connection_limit_beyond_the_semaphore_cap() {
        // TOML accepts integers far past what the accept semaphore can
        // hold; such a config must die here, not at daemon startup.
        let config = config_from(&format!(
            "[limits]\nmax_connections = {}\n",
            Semaphore::MAX_PERMITS + 1
        ));
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::LimitTooLarge {
                field: "max_connections",
                max: Semaphore::MAX_PERMITS,
            }]
        );

        let at_cap = config_from(&format!(
            "[limits]\nmax_connections = {}\n",
            Semaphore::MAX_PERMITS
        ));
        assert!(validate_config(&at_cap).is_ok());
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let disabled = config_from(
            r#"
            [observability]
            metrics_enabled = false
            metrics_address = "nonsense"
            "#,
        );
        assert!(validate_config(&disabled).is_ok());

        let enabled = config_from(
            r#"
            [observability]
            metrics_enabled = true
            metrics_address = "nonsense"
            "#,
        );
        assert!(matches!(
            validate_config(&enabled).unwrap_err()[0],
            ValidationError::BadMetricsAddress { .. }
        ));
    }

    #[test]
    fn mapped_v4_address_passes_with_warning_only() {
        let config = config_from(
            r#"
            [[bind]]
            address = "::ffff:192.0.2.1"
            ports = "6667"
            "#,
        );
        assert!(validate_config(&config).is_ok());
    }
}
