use super::ObjectKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A virtual L3 forwarding element
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalRouter {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ObjectKey>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub external_ids: BTreeMap<String, String>,
}

impl LogicalRouter {
    pub fn key(&self) -> ObjectKey {
        ObjectKey::for_name(&self.name)
    }

    pub fn add_port(&mut self, port: ObjectKey) {
        if !self.ports.contains(&port) {
            self.ports.push(port);
        }
    }
}

/// A router interface
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalRouterPort {
    pub name: String,

    pub mac: String,

    /// Addresses in CIDR notation
    #[serde(default)]
    pub networks: Vec<String>,
}

impl LogicalRouterPort {
    pub fn key(&self) -> ObjectKey {
        ObjectKey::for_name(&self.name)
    }
}
