use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

const DEFAULT_SERVER_NAME: &str = "localhost";
const DEFAULT_MAX_THREADS: usize = 10;
const DEFAULT_BUFFER_SIZE: usize = 16384;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings shared by every worker in the process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Value of `SERVER_NAME` in every request environment
    pub server_name: String,
    /// Upper bound on concurrently running workers
    pub max_threads: usize,
    /// Capacity of the buffered reader acquired per transaction
    pub buffer_size: usize,
    /// Maximum level handed to the log subscriber
    pub log_level: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            max_threads: DEFAULT_MAX_THREADS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Builds the configuration from `GANTRY_*` environment variables.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn load() -> Self {
        let defaults = Self::default();

        let server_name = std::env::var("GANTRY_SERVER_NAME")
            .unwrap_or(defaults.server_name);
        let max_threads = std::env::var("GANTRY_MAX_THREADS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_threads);
        let buffer_size = std::env::var("GANTRY_BUFFER_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.buffer_size);
        let log_level = std::env::var("GANTRY_LOG")
            .unwrap_or(defaults.log_level);

        Self { server_name, max_threads, buffer_size, log_level }
    }

    /// Parses a YAML document. Absent keys keep their defaults.
    pub fn from_yaml(source: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(source).context("Invalid worker configuration")
    }

    /// Reads and parses a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&source)
    }

    /// Whether the application may be invoked from several threads at once.
    pub fn multithread(&self) -> bool {
        self.max_threads > 1
    }
}
