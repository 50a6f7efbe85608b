//! # Errors
//!
//! Every failure the protocol core can produce, with the status class the
//! tus protocol mandates for it. Transport crates decide how to serialize;
//! [`TusError::to_json`] gives the Feathers-style body DogRS servers use.

use serde_json::json;
use thiserror::Error;

use crate::headers::{UPLOAD_DEFER_LENGTH, UPLOAD_LENGTH, UPLOAD_OFFSET};

/// Result type for tus operations
pub type TusResult<T> = Result<T, TusError>;

/// Status classes used by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,           // 404
    Conflict,           // 409
    PreconditionFailed, // 412
    PayloadTooLarge,    // 413
    GeneralError,       // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::PreconditionFailed => 412,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::GeneralError => 500,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::PreconditionFailed => "PreconditionFailed",
            ErrorKind::PayloadTooLarge => "PayloadTooLarge",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    /// Error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::PreconditionFailed => "precondition-failed",
            ErrorKind::PayloadTooLarge => "payload-too-large",
            ErrorKind::GeneralError => "general-error",
        }
    }
}

/// Errors that can occur while serving tus requests
#[derive(Error, Debug)]
pub enum TusError {
    #[error("Tus-Resumable Required")]
    VersionMissing,

    #[error("Precondition Failed")]
    InvalidHeaders(Vec<(String, String)>),

    #[error("{message}")]
    PreconditionFailed {
        message: String,
        headers: Vec<(String, String)>,
    },

    #[error("Store does not support {0} extension")]
    ExtensionUnsupported(&'static str),

    #[error("Upload length is already set")]
    LengthAlreadySet { length: u64 },

    #[error("Upload-Length ({length}) exceeds max upload size ({max_size})")]
    EntityTooLarge { length: u64, max_size: u64 },

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Offset mismatch, got {claimed} but expected {actual}")]
    OffsetConflict { claimed: u64, actual: u64 },

    #[error("Concurrent write detected")]
    ConcurrentWrite,

    #[error("Stream exceeded specified max of {limit} bytes")]
    BodyLimitExceeded { limit: u64 },

    #[error("store is missing {} methods", .0.join(","))]
    MissingStoreOperations(Vec<&'static str>),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    #[error("Upload completion hook failed: {0}")]
    HookFailed(#[source] anyhow::Error),

    #[error("Storage backend error: {source}")]
    Store {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TusError {
    /// Create a store error from any error type
    pub fn store<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store {
            source: Box::new(error),
        }
    }

    /// Precondition failure not tied to a header
    pub fn precondition<S: Into<String>>(message: S) -> Self {
        Self::PreconditionFailed {
            message: message.into(),
            headers: Vec::new(),
        }
    }

    /// A required header is absent
    pub fn missing_header(name: &str) -> Self {
        Self::PreconditionFailed {
            message: format!("Missing {} header", name),
            headers: vec![(name.to_string(), String::new())],
        }
    }

    /// A header is present but carries a value the operation rejects
    pub fn invalid_header(name: &str, value: &str) -> Self {
        Self::PreconditionFailed {
            message: "Precondition Failed".to_string(),
            headers: vec![(name.to_string(), value.to_string())],
        }
    }

    pub fn unknown_resource<S: Into<String>>(key: S) -> Self {
        Self::UnknownResource(key.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TusError::VersionMissing
            | TusError::InvalidHeaders(_)
            | TusError::PreconditionFailed { .. }
            | TusError::ExtensionUnsupported(_)
            | TusError::LengthAlreadySet { .. } => ErrorKind::PreconditionFailed,
            TusError::EntityTooLarge { .. } | TusError::BodyLimitExceeded { .. } => {
                ErrorKind::PayloadTooLarge
            }
            TusError::UnknownResource(_) => ErrorKind::NotFound,
            TusError::OffsetConflict { .. } | TusError::ConcurrentWrite => ErrorKind::Conflict,
            TusError::MissingStoreOperations(_)
            | TusError::InvalidConfig { .. }
            | TusError::HookFailed(_)
            | TusError::Store { .. }
            | TusError::Io { .. } => ErrorKind::GeneralError,
        }
    }

    pub fn code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Conflict-class failures can be retried once the client re-inspects the offset.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// The `(name, value)` header pairs this failure is attributed to.
    pub fn headers(&self) -> Vec<(String, String)> {
        let pair = |name: &str, value: String| vec![(name.to_string(), value)];
        match self {
            TusError::InvalidHeaders(headers) | TusError::PreconditionFailed { headers, .. } => {
                headers.clone()
            }
            TusError::OffsetConflict { claimed, .. } => pair(UPLOAD_OFFSET, claimed.to_string()),
            TusError::LengthAlreadySet { length } | TusError::EntityTooLarge { length, .. } => {
                pair(UPLOAD_LENGTH, length.to_string())
            }
            TusError::ExtensionUnsupported("creation-defer-length") => {
                pair(UPLOAD_DEFER_LENGTH, "1".to_string())
            }
            _ => Vec::new(),
        }
    }

    /// Value for the `Tus-Max-Size` response header, if this failure carries one.
    pub fn max_size(&self) -> Option<u64> {
        match self {
            TusError::EntityTooLarge { max_size, .. } => Some(*max_size),
            _ => None,
        }
    }

    /// The body must not be answered; the transport drops the connection instead.
    pub fn aborts_connection(&self) -> bool {
        matches!(self, TusError::BodyLimitExceeded { .. })
    }

    /// Message safe to show to clients; server-side details stay in the logs.
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::GeneralError => "Something went wrong with that request".to_string(),
            _ => self.to_string(),
        }
    }

    /// Feathers-ish JSON payload.
    pub fn to_json(&self) -> serde_json::Value {
        let kind = self.kind();
        let mut base = json!({
            "name": kind.name(),
            "message": self.client_message(),
            "code": kind.status_code(),
            "className": kind.class_name(),
        });

        let headers = self.headers();
        if !headers.is_empty() {
            let pairs: Vec<[&str; 2]> = headers
                .iter()
                .map(|(name, value)| [name.as_str(), value.as_str()])
                .collect();
            base["errors"] = json!({ "headers": pairs });
        }
        if let TusError::EntityTooLarge { length, max_size } = self {
            base["data"] = json!({ "maxSize": max_size, "uploadLength": length });
        }
        base
    }
}
