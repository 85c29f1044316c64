//! Unified service container for reshelve
//!
//! Provides shared access to all core services.

use crate::core::catalog::CatalogRegistry;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::replication::{RecoveryInspector, ReplicationReceiver, ReplicationTarget};
use std::sync::Arc;

/// Unified services container
///
/// All adapters use this same struct for service access.
#[derive(Clone)]
pub struct Services {
    /// Catalog of open indices
    pub registry: Arc<CatalogRegistry>,

    /// Receive-side replication protocol
    pub receiver: Arc<ReplicationReceiver>,

    /// Leftover inspection and repair
    pub recovery: Arc<RecoveryInspector>,

    /// Outbound replication targets from configuration
    pub targets: Vec<Arc<ReplicationTarget>>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl Services {
    /// Create services from configuration
    pub fn new(config: Config) -> Result<Self> {
        let registry = Arc::new(CatalogRegistry::from_config(&config)?);
        let receiver = Arc::new(ReplicationReceiver::new(Arc::clone(&registry)));
        let recovery = Arc::new(RecoveryInspector::new(Arc::clone(&registry)));

        let targets = config
            .replication
            .targets
            .iter()
            .cloned()
            .map(|d| ReplicationTarget::new(d).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            registry,
            receiver,
            recovery,
            targets,
            config: Arc::new(config),
        })
    }

    /// Target by name
    pub fn target(&self, name: &str) -> Option<&Arc<ReplicationTarget>> {
        self.targets.iter().find(|t| t.name() == name)
    }
}
