//! Settings for the HTTP surface, layered like [`tus_core::TusConfig`]:
//!
//! ```bash
//! export TUS__HOST=0.0.0.0        # host
//! export TUS__PORT=1080           # port
//! export TUS__BASE_PATH=/files    # base_path
//! export TUS__CORS=true           # cors
//! export TUS__MAX_SIZE=1073741824 # tus.max_size
//! ```

use tus_core::{TusConfig, TusError, TusResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path the upload collection is mounted at
    pub base_path: String,
    pub cors: bool,
    pub tus: TusConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1080,
            base_path: "/files".to_string(),
            cors: false,
            tus: TusConfig::default(),
        }
    }
}

fn invalid(key: &str, value: &str) -> TusError {
    TusError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_path<S: Into<String>>(mut self, base_path: S) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_cors(mut self, cors: bool) -> Self {
        self.cors = cors;
        self
    }

    pub fn with_tus(mut self, tus: TusConfig) -> Self {
        self.tus = tus;
        self
    }

    /// `host:port` to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Set a value by key; keys this layer does not own go to [`TusConfig::set`].
    pub fn set(&mut self, key: &str, value: &str) -> TusResult<()> {
        match key {
            "host" => self.host = value.to_string(),
            "port" => self.port = value.trim().parse().map_err(|_| invalid(key, value))?,
            "base_path" => self.base_path = value.to_string(),
            "cors" => {
                self.cors = match value.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => true,
                    "0" | "false" | "no" | "off" => false,
                    _ => return Err(invalid(key, value)),
                }
            }
            _ => self.tus.set(key, value)?,
        }
        Ok(())
    }

    /// Apply `PREFIX` + `KEY__SUB` pairs, same convention as the core.
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

    pub fn from_env(prefix: &str) -> TusResult<Self> {
        Self::default().apply_vars(prefix, std::env::vars())
    }
}
