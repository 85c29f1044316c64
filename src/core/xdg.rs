//! XDG Base Directory Support
//!
//! Resolves where reshelve keeps its configuration file, its default
//! data root and its logs on Linux/Unix systems.

use std::env;
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "reshelve";

/// XDG directory structure for reshelve
#[derive(Debug, Clone)]
pub struct XdgDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub state_dir: PathBuf,
}

/// Resolve one base directory
///
/// Priority order (highest to lowest):
/// 1. Explicit RESHELVE_* env var (used as-is)
/// 2. XDG_* env var plus the app name
/// 3. `$HOME/<fallback>` plus the app name
fn resolve(app_var: &str, xdg_var: &str, fallback: &[&str]) -> PathBuf {
    if let Ok(dir) = env::var(app_var) {
        return PathBuf::from(dir);
    }

    if let Ok(xdg) = env::var(xdg_var) {
        return PathBuf::from(xdg).join(APP_NAME);
    }

    let mut dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    for part in fallback {
        dir.push(part);
    }
    dir.join(APP_NAME)
}

impl XdgDirs {
    pub fn new() -> Self {
        Self {
            config_dir: resolve("RESHELVE_CONFIG_DIR", "XDG_CONFIG_HOME", &[".config"]),
            data_dir: resolve("RESHELVE_HOME", "XDG_DATA_HOME", &[".local", "share"]),
            state_dir: resolve("RESHELVE_STATE_DIR", "XDG_STATE_HOME", &[".local", "state"]),
        }
    }

    /// Get config file path
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Default data root: one subdirectory per index
    pub fn indices_dir(&self) -> PathBuf {
        self.data_dir.join("indices")
    }

    /// Get logs directory path
    pub fn logs_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    /// Create all XDG directories if they don't exist
    pub fn ensure_dirs_exist(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        fs::create_dir_all(self.indices_dir())?;
        fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }

    /// Log the resolved XDG paths
    pub fn log_paths(&self) {
        tracing::debug!("XDG directories resolved:");
        tracing::debug!("  Config: {:?}", self.config_dir);
        tracing::debug!("  Data: {:?}", self.data_dir);
        tracing::debug!("  State: {:?}", self.state_dir);
        tracing::debug!("  Config file: {:?}", self.config_file());
    }
}

impl Default for XdgDirs {
    fn default() -> Self {
        Self::new()
    }
}
