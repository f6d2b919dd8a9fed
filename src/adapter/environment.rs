//! The calling environment handed to a synchronous application.
//!
//! The key set is closed: every key the calling convention defines is a
//! field here. Required keys are plain fields and always present;
//! optional keys are `Option`s and only set when the request carries the
//! data. [`Environment::get`] resolves the conventional key names.

use axum::body::Body;
use axum::http::{header, Request};
use hyper::upgrade::OnUpgrade;
use serde::Serialize;
use std::io::{self, Write};

use crate::adapter::headers::{unwrap_headers, HeaderFields};
use crate::adapter::hijack::{Hijack, HijackedIo};
use crate::adapter::input::Input;
use crate::http::request::{authority, remote_address, version_string};

/// Conventional environment key names.
pub mod keys {
    pub const RACK_VERSION: &str = "rack.version";
    pub const RACK_URL_SCHEME: &str = "rack.url_scheme";
    pub const RACK_MULTITHREAD: &str = "rack.multithread";
    pub const RACK_MULTIPROCESS: &str = "rack.multiprocess";
    pub const RACK_RUN_ONCE: &str = "rack.run_once";
    pub const RACK_HIJACK_P: &str = "rack.hijack?";
    pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
    pub const SCRIPT_NAME: &str = "SCRIPT_NAME";
    pub const PATH_INFO: &str = "PATH_INFO";
    pub const QUERY_STRING: &str = "QUERY_STRING";
    pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
    pub const SERVER_NAME: &str = "SERVER_NAME";
    pub const SERVER_PORT: &str = "SERVER_PORT";
    pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
    pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";
    pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
    pub const HTTP_HOST: &str = "HTTP_HOST";
}

/// Calling convention version advertised to applications.
pub const RACK_VERSION: [u32; 3] = [2, 0, 0];

/// The error stream exposed to applications (process stderr).
#[derive(Debug, Default)]
pub struct Errors;

impl Write for Errors {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// One request's environment. Dropped when the application returns.
#[derive(Debug, Serialize)]
pub struct Environment {
    #[serde(rename = "rack.version")]
    pub version: [u32; 3],
    #[serde(skip)]
    pub input: Input,
    #[serde(skip)]
    pub errors: Errors,
    #[serde(rename = "rack.multithread")]
    pub multithread: bool,
    #[serde(rename = "rack.multiprocess")]
    pub multiprocess: bool,
    #[serde(rename = "rack.run_once")]
    pub run_once: bool,

    #[serde(rename = "REQUEST_METHOD")]
    pub request_method: String,
    /// Always empty: applications are mounted at the root.
    #[serde(rename = "SCRIPT_NAME")]
    pub script_name: String,
    #[serde(rename = "PATH_INFO")]
    pub path_info: String,
    #[serde(rename = "QUERY_STRING")]
    pub query_string: String,
    #[serde(rename = "SERVER_PROTOCOL")]
    pub server_protocol: String,
    #[serde(rename = "rack.url_scheme")]
    pub url_scheme: String,
    #[serde(rename = "SERVER_NAME")]
    pub server_name: String,
    #[serde(rename = "SERVER_PORT")]
    pub server_port: String,

    #[serde(rename = "CONTENT_TYPE", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(rename = "CONTENT_LENGTH", skip_serializing_if = "Option::is_none")]
    pub content_length: Option<String>,
    #[serde(rename = "REMOTE_ADDR", skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
    /// `HTTP_*` keys, including `HTTP_HOST`.
    #[serde(flatten)]
    pub headers: HeaderFields,

    #[serde(rename = "rack.hijack?")]
    pub hijack_available: bool,
    #[serde(skip)]
    hijack: Option<Hijack>,
}

impl Environment {
    /// Build the environment for one request.
    ///
    /// Never fails: absent query, port or authority become empty strings.
    /// Must be called inside a Tokio runtime (see [`Input`]).
    pub fn build(request: Request<Body>) -> Self {
        let server_protocol = version_string(request.version()).to_string();
        let authority = authority(&request);
        let remote_addr = remote_address(&request)
            .and_then(|addr| addr.ip())
            .map(|ip| ip.to_string());

        let (mut parts, body) = request.into_parts();

        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| parts.uri.path());
        let (path_info, query_string) = split_target(target);
        let (server_name, server_port) = split_authority(authority.as_deref().unwrap_or(""));

        let content_type = take_header(&mut parts.headers, header::CONTENT_TYPE);
        let content_length = take_header(&mut parts.headers, header::CONTENT_LENGTH);

        let mut headers = HeaderFields::new();
        unwrap_headers(&parts.headers, &mut headers);

        if !headers.contains(keys::HTTP_HOST) {
            if let Some(authority) = &authority {
                headers.append(keys::HTTP_HOST.to_string(), authority);
            }
        }

        let hijack = parts.extensions.remove::<OnUpgrade>().map(Hijack::new);

        Self {
            version: RACK_VERSION,
            input: Input::new(body),
            errors: Errors,
            multithread: true,
            multiprocess: true,
            run_once: false,
            request_method: parts.method.as_str().to_string(),
            script_name: String::new(),
            path_info: path_info.to_string(),
            query_string: query_string.to_string(),
            server_protocol,
            url_scheme: "http".to_string(),
            server_name: server_name.to_string(),
            server_port: server_port.to_string(),
            content_type,
            content_length,
            remote_addr,
            headers,
            hijack_available: hijack.is_some(),
            hijack,
        }
    }

    /// Resolve a conventional key to its string form.
    ///
    /// Booleans render as `"true"`/`"false"` and the version as `"2.0.0"`.
    /// Returns `None` for optional keys that are not set and for keys
    /// outside the convention.
    pub fn get(&self, key: &str) -> Option<String> {
        let flag = |b: bool| Some(b.to_string());
        match key {
            keys::RACK_VERSION => Some(
                self.version
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join("."),
            ),
            keys::RACK_URL_SCHEME => Some(self.url_scheme.clone()),
            keys::RACK_MULTITHREAD => flag(self.multithread),
            keys::RACK_MULTIPROCESS => flag(self.multiprocess),
            keys::RACK_RUN_ONCE => flag(self.run_once),
            keys::RACK_HIJACK_P => flag(self.hijack_available),
            keys::REQUEST_METHOD => Some(self.request_method.clone()),
            keys::SCRIPT_NAME => Some(self.script_name.clone()),
            keys::PATH_INFO => Some(self.path_info.clone()),
            keys::QUERY_STRING => Some(self.query_string.clone()),
            keys::SERVER_PROTOCOL => Some(self.server_protocol.clone()),
            keys::SERVER_NAME => Some(self.server_name.clone()),
            keys::SERVER_PORT => Some(self.server_port.clone()),
            keys::CONTENT_TYPE => self.content_type.clone(),
            keys::CONTENT_LENGTH => self.content_length.clone(),
            keys::REMOTE_ADDR => self.remote_addr.clone(),
            other => self.headers.get(other).map(str::to_string),
        }
    }

    /// Take over the connection. Only the first call returns a handle.
    pub fn hijack(&mut self) -> Option<HijackedIo> {
        self.hijack.take().map(Hijack::take)
    }
}

/// Split a request target into path and query on the first `?`.
pub fn split_target(target: &str) -> (&str, &str) {
    target.split_once('?').unwrap_or((target, ""))
}

/// Split an authority into name and port on the first `:`.
pub fn split_authority(authority: &str) -> (&str, &str) {
    authority.split_once(':').unwrap_or((authority, ""))
}

fn take_header(headers: &mut axum::http::HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .remove(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}
