use serde::{Deserialize, Serialize};

/// One entry of the `k8s.v1.cni.cncf.io/networks` pod annotation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSelectionElement {
    /// Name of the network attachment definition
    pub name: String,

    /// Namespace of the network attachment definition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Interface name requested inside the pod
    #[serde(rename = "interface", default, skip_serializing_if = "Option::is_none")]
    pub interface_request: Option<String>,
}

impl NetworkSelectionElement {
    /// Build an element from `namespace/name` or a bare `name`, the latter
    /// resolved in `default_namespace`
    pub fn from_attachment(attachment: &str, default_namespace: &str) -> Self {
        let (namespace, name) = match attachment.split_once('/') {
            Some((namespace, name)) => (namespace, name),
            None => (default_namespace, attachment),
        };
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            interface_request: None,
        }
    }
}
