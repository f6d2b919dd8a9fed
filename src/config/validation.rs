//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every endpoint parses and every host is unique
//! - Validate addresses and timeouts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::proxy::endpoint::Endpoint;
use crate::proxy::router::normalize_authority;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    if config.proxy.identifier.trim().is_empty()
        || axum::http::HeaderValue::from_str(&config.proxy.identifier).is_err()
    {
        errors.push(ValidationError::new(
            "proxy.identifier",
            "must be a non-empty header-safe token",
        ));
    }

    if config.proxy.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "proxy.connect_timeout_secs",
            "must be greater than zero",
        ));
    }

    let mut seen = HashSet::new();
    for (i, host) in config.hosts.iter().enumerate() {
        let normalized = normalize_authority(host.host.trim());
        if normalized.is_empty() {
            errors.push(ValidationError::new(format!("hosts[{i}].host"), "must not be empty"));
        } else if !seen.insert(normalized.clone()) {
            errors.push(ValidationError::new(
                format!("hosts[{i}].host"),
                format!("duplicate host {normalized:?}"),
            ));
        }

        if let Err(e) = Endpoint::parse(&host.endpoint) {
            errors.push(ValidationError::new(format!("hosts[{i}].endpoint"), e.to_string()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
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
    use crate::config::schema::HostConfig;

    fn host(host: &str, endpoint: &str) -> HostConfig {
        HostConfig {
            host: host.into(),
            endpoint: endpoint.into(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.proxy.connect_timeout_secs = 0;
        config.hosts = vec![
            host("example.com", "http://10.0.0.1:80"),
            host("Example.com.:443", "http://10.0.0.2:80"),
            host("", "https://secure"),
        ];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "proxy.connect_timeout_secs",
                "hosts[1].host",
                "hosts[2].host",
                "hosts[2].endpoint",
            ]
        );
    }
}
