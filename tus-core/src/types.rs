use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use uuid::Uuid;

use crate::Metadata;

/// Stream of bytes for upload content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Opaque identifier of an upload resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadKey(pub String);

impl UploadKey {
    /// Generate a new random key
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create from existing string
    pub fn from_string(key: String) -> Self {
        Self(key)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UploadKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UploadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UploadKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Server-side state of one upload, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResource {
    pub key: UploadKey,
    /// Bytes durably accepted so far
    pub offset: u64,
    /// `None` while the length is deferred
    pub upload_length: Option<u64>,
    pub metadata: Metadata,
    pub created_at: i64,
}

impl UploadResource {
    pub fn new(key: UploadKey, upload_length: Option<u64>, metadata: Metadata) -> Self {
        Self {
            key,
            offset: 0,
            upload_length,
            metadata,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.upload_length.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.upload_length == Some(self.offset)
    }

    /// Bytes still expected, when the length is known
    pub fn remaining(&self) -> Option<u64> {
        self.upload_length.map(|len| len.saturating_sub(self.offset))
    }
}

/// Arguments handed to the store's creation primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUpload {
    pub deferred: bool,
    pub metadata: Metadata,
    pub upload_length: Option<u64>,
}

/// Length as observed by a status inquiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadLength {
    Known(u64),
    Deferred,
}

/// Result of inspecting an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadStatus {
    pub offset: u64,
    pub length: UploadLength,
    pub metadata: Metadata,
}

impl From<UploadResource> for UploadStatus {
    fn from(upload: UploadResource) -> Self {
        Self {
            offset: upload.offset,
            length: match upload.upload_length {
                Some(len) => UploadLength::Known(len),
                None => UploadLength::Deferred,
            },
            metadata: upload.metadata,
        }
    }
}
