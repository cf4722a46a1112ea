use anyhow::Context;
use serde::Deserialize;

/// Server configuration.
///
/// Loaded from an optional YAML file (pointed at by `BEACON_CONFIG`),
/// with the listen address overridable through the `LISTEN` environment
/// variable. Every field has a default, so an empty file or no file at
/// all is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the listening socket binds to.
    pub listen_addr: String,
    /// Capacity of the per-connection read buffer.
    pub read_buffer_size: usize,
    /// Maximum number of headers accepted per request.
    pub max_headers: usize,
    /// Maximum size of the request head (request line + headers).
    pub max_header_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            read_buffer_size: 4096,
            max_headers: 32,
            max_header_bytes: 16 * 1024,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let mut cfg = match std::env::var("BEACON_CONFIG") {
            Ok(path) => match Self::from_yaml_file(&path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "failed to load config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };

        if let Ok(addr) = std::env::var("LISTEN") {
            cfg.listen_addr = addr;
        }

        cfg
    }

    pub fn from_yaml_file(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path))?;
        let cfg = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path))?;
        Ok(cfg)
    }
}
