//! Forwarding and hop-by-hop header policy.
//!
//! # Responsibilities
//! - Append the client IP to `x-forwarded-for`
//! - Append a `via` entry naming this proxy
//! - Strip hop-by-hop headers before forwarding
//!
//! # Design Decisions
//! - Forwarding headers are appended, never replaced, so proxy chains
//!   stay visible to the backend
//! - Headers listed in `connection` are stripped along with the fixed set

use axum::http::header::{HeaderName, InvalidHeaderValue};
use axum::http::{header, HeaderMap, HeaderValue};
use std::net::IpAddr;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Headers that only apply to a single transport hop.
pub const HOP_HEADERS: [&str; 6] = [
    "connection",
    "keep-alive",
    "public",
    "proxy-authenticate",
    "transfer-encoding",
    "upgrade",
];

pub fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    if let Ok(value) = HeaderValue::from_str(&ip.to_string()) {
        headers.append(HeaderName::from_static(X_FORWARDED_FOR), value);
    }
}

pub fn append_via(
    headers: &mut HeaderMap,
    version: &str,
    identifier: &str,
) -> Result<(), InvalidHeaderValue> {
    let value = HeaderValue::from_str(&format!("{version} {identifier}"))?;
    headers.append(header::VIA, value);
    Ok(())
}

/// Remove hop-by-hop headers.
pub fn prepare_headers(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_HEADERS {
        headers.remove(name);
    }
}
