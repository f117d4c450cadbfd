/// Northbound database object model
///
/// Objects are identified by an [`ObjectKey`] that is a pure function of
/// the object's name, so two synthesis passes over the same input agree on
/// every key without consulting the database.

pub mod acl;
pub mod logical_router;
pub mod logical_switch;

pub use acl::{Acl, AclAction, AclDirection};
pub use logical_router::{LogicalRouter, LogicalRouterPort};
pub use logical_switch::{LogicalPortType, LogicalSwitch, LogicalSwitchPort};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix appended to an object name to form its key
pub const KEY_SUFFIX: &str = "-UUID";

/// Stable identity of a northbound object
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Key for the object called `name`
    pub fn for_name(name: &str) -> Self {
        Self(format!("{}{}", name, KEY_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Any object the synthesizer can emit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table")]
pub enum NbObject {
    #[serde(rename = "Logical_Switch")]
    LogicalSwitch(LogicalSwitch),
    #[serde(rename = "Logical_Switch_Port")]
    LogicalSwitchPort(LogicalSwitchPort),
    #[serde(rename = "Logical_Router")]
    LogicalRouter(LogicalRouter),
    #[serde(rename = "Logical_Router_Port")]
    LogicalRouterPort(LogicalRouterPort),
    #[serde(rename = "ACL")]
    Acl(Acl),
}

impl NbObject {
    pub fn name(&self) -> &str {
        match self {
            NbObject::LogicalSwitch(o) => &o.name,
            NbObject::LogicalSwitchPort(o) => &o.name,
            NbObject::LogicalRouter(o) => &o.name,
            NbObject::LogicalRouterPort(o) => &o.name,
            NbObject::Acl(o) => &o.name,
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::for_name(self.name())
    }

    /// Northbound table the object lives in
    pub fn table(&self) -> &'static str {
        match self {
            NbObject::LogicalSwitch(_) => "Logical_Switch",
            NbObject::LogicalSwitchPort(_) => "Logical_Switch_Port",
            NbObject::LogicalRouter(_) => "Logical_Router",
            NbObject::LogicalRouterPort(_) => "Logical_Router_Port",
            NbObject::Acl(_) => "ACL",
        }
    }
}

impl From<LogicalSwitch> for NbObject {
    fn from(value: LogicalSwitch) -> Self {
        NbObject::LogicalSwitch(value)
    }
}

impl From<LogicalSwitchPort> for NbObject {
    fn from(value: LogicalSwitchPort) -> Self {
        NbObject::LogicalSwitchPort(value)
    }
}

impl From<LogicalRouter> for NbObject {
    fn from(value: LogicalRouter) -> Self {
        NbObject::LogicalRouter(value)
    }
}

impl From<LogicalRouterPort> for NbObject {
    fn from(value: LogicalRouterPort) -> Self {
        NbObject::LogicalRouterPort(value)
    }
}

impl From<Acl> for NbObject {
    fn from(value: Acl) -> Self {
        NbObject::Acl(value)
    }
}
