//! Configuration for both binaries.
//!
//! Values come from an optional YAML file; every field has a default so an
//! empty or partial file is valid. The `LISTEN` environment variable
//! overrides the server's listen address.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming the YAML configuration file.
pub const CONFIG_ENV: &str = "FERRY_CONFIG";
/// Environment variable overriding `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Directory whose files are served
    pub root: PathBuf,
    /// File served for `/`
    pub index: String,
    /// Connections with no new request for this long are closed
    pub idle_timeout_ms: u64,
    /// Exact request path -> `Location` target
    pub redirects: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub connect_timeout_ms: u64,
    /// Bound on each wait for response bytes
    pub read_timeout_ms: u64,
    /// Where retrieved files are written
    pub output_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let mut redirects = BTreeMap::new();
        redirects.insert("/redirect".to_string(), "/result.html".to_string());

        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            root: PathBuf::from("files"),
            index: "index.html".to_string(),
            idle_timeout_ms: 1000,
            redirects,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// `path` wins over `FERRY_CONFIG`; with neither, defaults are used.
    /// `LISTEN` is applied last.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        let mut cfg = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;

        Self::from_yaml_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_str(text)?)
    }
}
