//! Virtual-host routing.
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) host lookup via HashMap
//! - Host matching is case-insensitive; a trailing `.` and `:port` are
//!   ignored
//! - Explicit no-match (`None`) rather than a silent default

use axum::http::Request;
use std::collections::HashMap;

use crate::http::request::authority;
use crate::proxy::endpoint::Endpoint;

/// Normalize an authority for lookup: drop `:port`, then one trailing
/// `.`, then lowercase.
///
/// `Example.com.:80`, `example.com:80` and `example.com` all normalize to
/// `example.com`.
pub fn normalize_authority(authority: &str) -> String {
    let host = match authority.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => authority,
    };
    let host = host.strip_suffix('.').unwrap_or(host);
    host.to_ascii_lowercase()
}

/// Maps normalized hosts to backend endpoints.
#[derive(Debug, Clone, Default)]
pub struct HostRouter {
    hosts: HashMap<String, Endpoint>,
}

impl HostRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `host`. The key is normalized like request authorities.
    pub fn insert(&mut self, host: &str, endpoint: Endpoint) -> Option<Endpoint> {
        self.hosts.insert(normalize_authority(host), endpoint)
    }

    /// Route a request by its authority.
    pub fn lookup<B>(&self, request: &Request<B>) -> Option<&Endpoint> {
        self.resolve(&authority(request)?)
    }

    /// Route a raw authority string.
    pub fn resolve(&self, authority: &str) -> Option<&Endpoint> {
        if authority.is_empty() {
            return None;
        }
        self.hosts.get(&normalize_authority(authority))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl FromIterator<(String, Endpoint)> for HostRouter {
    fn from_iter<I: IntoIterator<Item = (String, Endpoint)>>(iter: I) -> Self {
        let mut router = HostRouter::new();
        for (host, endpoint) in iter {
            router.insert(&host, endpoint);
        }
        router
    }
}
