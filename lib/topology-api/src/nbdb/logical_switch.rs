use super::ObjectKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A virtual L2 segment
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalSwitch {
    pub name: String,

    /// Keys of the member switch ports, in attachment order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ObjectKey>,

    /// Keys of the ACLs applied to this switch
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acls: Vec<ObjectKey>,

    /// `subnet` / `exclude_ips` and similar switch-wide settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_config: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub external_ids: BTreeMap<String, String>,
}

impl LogicalSwitch {
    pub fn key(&self) -> ObjectKey {
        ObjectKey::for_name(&self.name)
    }

    /// Add a member port unless it is already present
    pub fn add_port(&mut self, port: ObjectKey) {
        if !self.ports.contains(&port) {
            self.ports.push(port);
        }
    }

    /// Add an ACL unless it is already present
    pub fn add_acl(&mut self, acl: ObjectKey) {
        if !self.acls.contains(&acl) {
            self.acls.push(acl);
        }
    }
}

/// Type tag of a logical switch port
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalPortType {
    /// A plain workload endpoint
    #[default]
    #[serde(rename = "")]
    Endpoint,
    /// Peer of a logical router port
    #[serde(rename = "router")]
    Router,
}

impl LogicalPortType {
    pub fn is_endpoint(&self) -> bool {
        matches!(self, LogicalPortType::Endpoint)
    }
}

/// An interface attached to a logical switch
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalSwitchPort {
    pub name: String,

    /// `"<mac> <ip>"` pairs, or the literal `"router"`
    #[serde(default)]
    pub addresses: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub external_ids: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_security: Vec<String>,

    #[serde(rename = "type", default, skip_serializing_if = "LogicalPortType::is_endpoint")]
    pub port_type: LogicalPortType,
}

impl LogicalSwitchPort {
    pub fn key(&self) -> ObjectKey {
        ObjectKey::for_name(&self.name)
    }
}
