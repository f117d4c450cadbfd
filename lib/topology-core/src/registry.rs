//! Registry of the desired topology of every network

use crate::object_set::{ObjectDelta, ObjectSet};
use crate::{CoreError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// TopologyRegistry keeps the last synthesized object set of each network
#[derive(Clone)]
pub struct TopologyRegistry {
    // Map of network name to its desired objects
    networks: Arc<RwLock<HashMap<String, ObjectSet>>>,
}

impl TopologyRegistry {
    pub fn new() -> Self {
        Self {
            networks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register or replace the desired objects of a network, returning what
    /// changed since the previous registration
    pub async fn register(&self, network: &str, objects: ObjectSet) -> Result<ObjectDelta> {
        let mut networks = self.networks.write().await;
        let delta = match networks.get(network) {
            Some(previous) => objects.diff(previous),
            None => objects.diff(&ObjectSet::new()),
        };
        networks.insert(network.to_string(), objects);

        debug!(
            "Registered network {}: {} added, {} changed, {} removed",
            network,
            delta.added.len(),
            delta.changed.len(),
            delta.removed.len()
        );
        Ok(delta)
    }

    /// Get the desired objects of a network
    pub async fn get(&self, network: &str) -> Result<ObjectSet> {
        let networks = self.networks.read().await;
        networks
            .get(network)
            .cloned()
            .ok_or_else(|| CoreError::NetworkNotFound(network.to_string()))
    }

    /// List registered networks, sorted by name
    pub async fn list_networks(&self) -> Vec<String> {
        let networks = self.networks.read().await;
        let mut names: Vec<String> = networks.keys().cloned().collect();
        names.sort();
        names
    }

    /// Deregister a network, returning the objects it owned
    pub async fn deregister(&self, network: &str) -> Result<ObjectSet> {
        let mut networks = self.networks.write().await;
        let objects = networks
            .remove(network)
            .ok_or_else(|| CoreError::NetworkNotFound(network.to_string()))?;
        debug!("Deregistered network: {}", network);
        Ok(objects)
    }

    /// Get count of registered networks
    pub async fn network_count(&self) -> usize {
        let networks = self.networks.read().await;
        networks.len()
    }
}

impl Default for TopologyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
