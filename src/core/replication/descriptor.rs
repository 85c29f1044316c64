//! Outbound replication targets.
//!
//! A descriptor says where and how the push driver should send an
//! index. This crate only stores and validates them; the driver that
//! executes a push lives with the network transport.

use crate::core::error::{Result, ReshelveError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard};
use std::time::Duration;

/// What a target receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplicationKind {
    /// Complete index content
    FullIndex,
    /// Point-in-time copy kept off the serving path
    Backup,
    /// Schema and settings only
    SchemaOnly,
    /// Crawler database: pending fetch queue
    CrawlerQueue,
    /// Crawler database: fetch history
    CrawlerHistory,
}

impl fmt::Display for ReplicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReplicationKind::FullIndex => "full-index",
            ReplicationKind::Backup => "backup",
            ReplicationKind::SchemaOnly => "schema-only",
            ReplicationKind::CrawlerQueue => "crawler-queue",
            ReplicationKind::CrawlerHistory => "crawler-history",
        };
        f.write_str(s)
    }
}

fn default_timeout_ms() -> u64 {
    60_000
}

/// Addressing and credentials for one target
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationDescriptor {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub secret: String,
    pub kind: ReplicationKind,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl fmt::Debug for ReplicationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicationDescriptor")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("login", &self.login)
            .field("secret", &"<redacted>")
            .field("kind", &self.kind)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl ReplicationDescriptor {
    pub fn new(name: &str, url: &str, kind: ReplicationKind) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            login: String::new(),
            secret: String::new(),
            kind,
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ReshelveError::ConfigError(
                "Replication target name must be non-empty".to_string(),
            ));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ReshelveError::ConfigError(format!(
                "Replication target '{}' has a non-HTTP url: {}",
                self.name, self.url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ReshelveError::ConfigError(format!(
                "Replication target '{}' timeout must be non-zero",
                self.name
            )));
        }
        Ok(())
    }

    /// Copy safe to print or serialize for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.secret.is_empty() {
            copy.secret = "********".to_string();
        }
        copy
    }
}

/// A descriptor shared between threads; every change goes through its lock
#[derive(Debug)]
pub struct ReplicationTarget {
    inner: RwLock<ReplicationDescriptor>,
}

impl ReplicationTarget {
    pub fn new(descriptor: ReplicationDescriptor) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self {
            inner: RwLock::new(descriptor),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, ReplicationDescriptor> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    /// Consistent copy of every field
    pub fn snapshot(&self) -> ReplicationDescriptor {
        self.read().clone()
    }

    /// Apply `change` atomically; rejected changes leave the target as it was
    pub fn update(&self, change: impl FnOnce(&mut ReplicationDescriptor)) -> Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut next = guard.clone();
        change(&mut next);
        next.validate()?;
        *guard = next;
        Ok(())
    }

    pub fn set_credentials(&self, login: &str, secret: &str) -> Result<()> {
        self.update(|d| {
            d.login = login.to_string();
            d.secret = secret.to_string();
        })
    }

    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        self.update(|d| d.timeout_ms = timeout.as_millis() as u64)
    }
}
