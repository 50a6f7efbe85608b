//! `Upload-Metadata` microformat.
//!
//! The header is a comma-separated list of `key base64value` pairs. Keys are
//! ASCII without spaces or commas; values are arbitrary strings, base64
//! encoded on the wire.
//!
//! Decoding is lenient: a pair that does not split into exactly one key and
//! one value, or whose value is not valid base64, is dropped without error.
//! The request-level header validator rejects malformed pair shapes before
//! the state machine ever decodes them.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Ordered key/value metadata attached to an upload at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. An existing key keeps its position and takes the new value.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}

/// Decode an `Upload-Metadata` header value. Absent or empty input yields an empty mapping.
pub fn parse_metadata(header: Option<&str>) -> Metadata {
    let mut metadata = Metadata::new();
    let Some(header) = header else {
        return metadata;
    };

    for pair in header.split(',').map(str::trim) {
        let parts: Vec<&str> = pair.split(' ').collect();
        let [key, value] = parts.as_slice() else {
            continue;
        };
        match STANDARD.decode(value) {
            Ok(bytes) => metadata.insert(*key, String::from_utf8_lossy(&bytes)),
            Err(e) => tracing::debug!(key = %key, error = %e, "dropping undecodable metadata value"),
        }
    }
    metadata
}

/// Encode metadata for the `Upload-Metadata` header. Returns an empty string
/// for empty metadata; callers omit the header then.
pub fn encode_metadata(metadata: &Metadata) -> String {
    metadata
        .iter()
        .map(|(key, value)| format!("{} {}", key, STANDARD.encode(value)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Shape check used by the header validator: every pair is exactly `key value`.
pub(crate) fn is_well_formed(header: &str) -> bool {
    header
        .split(',')
        .map(str::trim)
        .all(|pair| pair.split(' ').count() == 2)
}
