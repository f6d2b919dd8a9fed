//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Proxy behaviour.
    pub proxy: ProxySettings,

    /// Virtual hosts forwarded to backends.
    pub hosts: Vec<HostConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9292").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9292".to_string(),
        }
    }
}

/// Handler that receives requests for unregistered hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Answer `400 Bad Request`.
    #[default]
    BadRequest,
    /// Serve the built-in environment echo application.
    Echo,
}

/// Proxy settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Token added to `via` headers.
    pub identifier: String,

    /// What to do with requests no host matches.
    pub fallback: Fallback,

    /// Backend connection timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            identifier: "rackgate".to_string(),
            fallback: Fallback::default(),
            connect_timeout_secs: 5,
        }
    }
}

/// One virtual host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Host to match (port and trailing dot ignored).
    pub host: String,

    /// Backend address (e.g., "http://127.0.0.1:3000").
    pub endpoint: String,
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
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
