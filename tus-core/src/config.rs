//! # Configuration
//!
//! Protocol-level settings for a [`crate::TusServer`]. Values can be set
//! through the builder or layered from environment variables:
//!
//! ```bash
//! export TUS__MAX_SIZE=1073741824   # max_size
//! ```

use crate::{TusError, TusResult};

/// Configuration for the protocol core
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TusConfig {
    /// Upper bound on `Upload-Length`, applied on top of the store's own
    /// bound (the smaller wins). `None` leaves the store's bound alone.
    pub max_size: Option<u64>,
}

impl TusConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max upload size
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    /// Set a value by its dotted key, e.g. `max_size`.
    ///
    /// Unknown keys are ignored so one environment can carry settings for
    /// other layers.
    pub fn set(&mut self, key: &str, value: &str) -> TusResult<()> {
        if key == "max_size" {
            let bytes = value.trim().parse::<u64>().map_err(|_| TusError::InvalidConfig {
                key: key.to_string(),
                value: value.to_string(),
            })?;
            self.max_size = Some(bytes);
        }
        Ok(())
    }

    /// Apply `PREFIX` + `KEY__SUB` pairs: `TUS__MAX_SIZE` becomes `max_size`.
    pub fn apply_vars<I>(mut self, prefix: &str, vars: I) -> TusResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(&normalized, &value)?;
            }
        }
        Ok(self)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env(prefix: &str) -> TusResult<Self> {
        Self::default().apply_vars(prefix, std::env::vars())
    }
}
