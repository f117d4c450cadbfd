use serde::{Deserialize, Serialize};

/// Per-network addressing of a pod as carried in the
/// `k8s.ovn.org/pod-networks` annotation
///
/// Optional fields are left out of the encoding when empty; consumers treat
/// an absent field and a zero value differently.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodAnnotation {
    /// Addresses in CIDR notation
    #[serde(rename = "ip_addresses")]
    pub ips: Vec<String>,

    #[serde(rename = "mac_address")]
    pub mac: String,

    #[serde(rename = "gateway_ips", default, skip_serializing_if = "Vec::is_empty")]
    pub gateways: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<PodRoute>,

    /// Legacy single-address form
    #[serde(rename = "ip_address", default, skip_serializing_if = "String::is_empty")]
    pub ip: String,

    /// Legacy single-gateway form
    #[serde(rename = "gateway_ip", default, skip_serializing_if = "String::is_empty")]
    pub gateway: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub tunnel_id: u32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
}

/// A route installed in the pod for one network
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodRoute {
    pub dest: String,
    #[serde(rename = "nextHop")]
    pub next_hop: String,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}
