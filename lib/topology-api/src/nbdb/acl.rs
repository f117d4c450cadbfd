use super::ObjectKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Priority used by the allow rules covering node management traffic
pub const DEFAULT_ALLOW_PRIORITY: u16 = 1012;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AclDirection {
    #[default]
    ToLport,
    FromLport,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AclAction {
    Allow,
    #[default]
    AllowRelated,
    Drop,
}

/// An access control rule attached to exactly one logical switch
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub name: String,

    pub direction: AclDirection,

    pub priority: u16,

    #[serde(rename = "match")]
    pub match_expr: String,

    pub action: AclAction,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub external_ids: BTreeMap<String, String>,
}

impl Acl {
    pub fn key(&self) -> ObjectKey {
        ObjectKey::for_name(&self.name)
    }
}
