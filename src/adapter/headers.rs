//! Request header multiplexing.
//!
//! The synchronous calling convention has one value per header key, so
//! repeated request headers are folded into a single newline-separated
//! value instead of being dropped or overwritten.

use axum::http::HeaderMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Prefix marking environment keys derived from request headers.
pub const HTTP_PREFIX: &str = "HTTP_";

/// Compute the environment key for a header name.
///
/// `x-forwarded-for` becomes `HTTP_X_FORWARDED_FOR`.
pub fn env_key(name: &str) -> String {
    let mut key = String::with_capacity(HTTP_PREFIX.len() + name.len());
    key.push_str(HTTP_PREFIX);
    key.extend(name.chars().map(|c| match c {
        '-' => '_',
        c => c.to_ascii_uppercase(),
    }));
    key
}

/// `HTTP_*` environment entries in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    entries: Vec<(String, String)>,
}

impl HeaderFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry by its environment key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key`, or append `value` on a new line if it is already set.
    pub fn append(&mut self, key: String, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, current)) => {
                current.push('\n');
                current.push_str(value);
            }
            None => self.entries.push((key, value.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for HeaderFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Fold every header in `headers` into `fields`.
///
/// Values for the same name keep the order they were received in.
/// Non-UTF-8 bytes are replaced rather than rejected.
pub fn unwrap_headers(headers: &HeaderMap, fields: &mut HeaderFields) {
    for (name, value) in headers.iter() {
        let value = String::from_utf8_lossy(value.as_bytes());
        fields.append(env_key(name.as_str()), &value);
    }
}
