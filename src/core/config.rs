//! Configuration management for the reshelve catalog.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::error::{Result, ReshelveError};
use crate::core::replication::ReplicationDescriptor;
use crate::core::xdg::XdgDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub replication: ReplicationConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per index
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
}

/// Catalog behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// How long `get` and swap admission wait on a locked directory
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Directory names under the data root that are never indices
    #[serde(default = "default_reserved_names")]
    pub reserved_names: Vec<String>,

    /// Tantivy writer memory budget for local document loads
    #[serde(default = "default_writer_heap_bytes")]
    pub writer_heap_bytes: usize,
}

/// Outbound replication targets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReplicationConfig {
    #[serde(default)]
    pub targets: Vec<ReplicationDescriptor>,
}

// Default value functions
fn default_data_root() -> PathBuf {
    PathBuf::from("./indices")
}

fn default_lock_timeout_ms() -> u64 {
    30_000
}

fn default_reserved_names() -> Vec<String> {
    vec![
        "lost+found".to_string(),
        "conf".to_string(),
        "logs".to_string(),
    ]
}

fn default_writer_heap_bytes() -> usize {
    50_000_000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            reserved_names: default_reserved_names(),
            writer_heap_bytes: default_writer_heap_bytes(),
        }
    }
}

impl CatalogConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ReshelveError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write configuration as TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load config with priority: env vars > TOML > defaults
    ///
    /// This method uses XDG Base Directory specification for file locations.
    pub fn load() -> Result<Self> {
        let xdg = XdgDirs::new();
        Self::load_with_xdg(&xdg)
    }

    /// Load config with explicit XDG directories
    ///
    /// Priority order:
    /// 1. RESHELVE_CONFIG env var
    /// 2. XDG config file (~/.config/reshelve/config.toml)
    /// 3. Defaults
    pub fn load_with_xdg(xdg: &XdgDirs) -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("RESHELVE_CONFIG") {
            Self::from_file(config_path)?
        } else {
            let xdg_config = xdg.config_file();
            if xdg_config.exists() {
                Self::from_file(xdg_config)?
            } else {
                Self::default()
            }
        };

        // Data root follows XDG unless set explicitly
        if env::var("RESHELVE_DATA_DIR").is_err() && config.storage.data_root == default_data_root()
        {
            config.storage.data_root = xdg.indices_dir();
        }

        config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(data_dir) = env::var("RESHELVE_DATA_DIR") {
            self.storage.data_root = PathBuf::from(data_dir);
        }

        if let Ok(timeout) = env::var("RESHELVE_LOCK_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.catalog.lock_timeout_ms = ms;
            }
        }
        if let Ok(heap) = env::var("RESHELVE_WRITER_HEAP_BYTES") {
            if let Ok(bytes) = heap.parse() {
                self.catalog.writer_heap_bytes = bytes;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.catalog.lock_timeout_ms == 0 {
            return Err(ReshelveError::ConfigError(
                "Lock timeout must be non-zero".to_string(),
            ));
        }

        // Tantivy refuses writer budgets below 15MB
        if self.catalog.writer_heap_bytes < 15_000_000 {
            return Err(ReshelveError::ConfigError(
                "Writer heap must be at least 15000000 bytes".to_string(),
            ));
        }

        if let Some(bad) = self
            .catalog
            .reserved_names
            .iter()
            .find(|n| n.is_empty() || n.contains('/'))
        {
            return Err(ReshelveError::ConfigError(format!(
                "Reserved name '{bad}' is not a directory name"
            )));
        }

        let mut seen = HashSet::new();
        for target in &self.replication.targets {
            target.validate()?;
            if !seen.insert(target.name.as_str()) {
                return Err(ReshelveError::ConfigError(format!(
                    "Duplicate replication target '{}'",
                    target.name
                )));
            }
        }

        Ok(())
    }

    /// Log configuration (redacting sensitive values)
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Data root: {:?}", self.storage.data_root);
        tracing::info!("  Lock timeout: {}ms", self.catalog.lock_timeout_ms);
        tracing::info!("  Reserved names: {:?}", self.catalog.reserved_names);
        tracing::info!("  Writer heap: {} bytes", self.catalog.writer_heap_bytes);
        for target in &self.replication.targets {
            let target = target.redacted();
            tracing::info!(
                "  Target '{}': {} ({}, login '{}', secret {})",
                target.name,
                target.url,
                target.kind,
                target.login,
                target.secret
            );
        }
    }
}
