//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::proxy::client::ClientOptions;
use crate::proxy::endpoint::{Endpoint, EndpointError};
use crate::proxy::pool::EndpointPool;
use crate::proxy::router::HostRouter;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

impl GatewayConfig {
    /// Build the host routing table.
    pub fn host_router(&self) -> Result<HostRouter, EndpointError> {
        let mut router = HostRouter::new();
        for host in &self.hosts {
            router.insert(&host.host, Endpoint::parse(&host.endpoint)?);
        }
        Ok(router)
    }

    /// Build an empty endpoint pool with the configured client settings.
    pub fn endpoint_pool(&self) -> Arc<EndpointPool> {
        Arc::new(EndpointPool::new(ClientOptions {
            connect_timeout: Some(Duration::from_secs(self.proxy.connect_timeout_secs)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_are_reported() {
        let err = parse_config("[listener\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_errors_are_reported() {
        let err = parse_config("[proxy]\nconnect_timeout_secs = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_files_are_io_errors() {
        let err = load_config(Path::new("/nonexistent/rackgate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn routing_table_is_built_from_hosts() {
        let config = parse_config(
            "[[hosts]]\nhost = \"api.example.com\"\nendpoint = \"127.0.0.1:3000\"\n",
        )
        .unwrap();
        let router = config.host_router().unwrap();
        assert_eq!(
            router.resolve("api.example.com:443"),
            Some(&Endpoint::new("127.0.0.1", 3000))
        );
        assert!(config.endpoint_pool().is_empty());
    }
}
