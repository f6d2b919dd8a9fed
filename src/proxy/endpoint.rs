//! Backend endpoint identity.
//!
//! An endpoint is the pooling key: two spellings of the same backend
//! (`Backend.Local:80`, `http://backend.local`) parse to equal values.

use std::fmt;
use std::str::FromStr;
use url::Url;

/// Error parsing an endpoint.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid endpoint {input:?}: {source}")]
    Invalid {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {0:?} (only http is proxied)")]
    UnsupportedScheme(String),

    #[error("endpoint {0:?} has no host")]
    MissingHost(String),
}

/// A backend the proxy forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into().to_ascii_lowercase(),
            port,
        }
    }

    /// Parse `http://host[:port]` or bare `host[:port]`. Port defaults to 80.
    pub fn parse(input: &str) -> Result<Self, EndpointError> {
        let candidate = if input.contains("://") {
            input.to_string()
        } else {
            format!("http://{input}")
        };

        let url = Url::parse(&candidate).map_err(|source| EndpointError::Invalid {
            input: input.to_string(),
            source,
        })?;

        if url.scheme() != "http" {
            return Err(EndpointError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| EndpointError::MissingHost(input.to_string()))?;

        Ok(Self::new(host, url.port_or_known_default().unwrap_or(80)))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, as used in the upstream request URI.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::parse(s)
    }
}
