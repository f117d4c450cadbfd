use serde::{Deserialize, Serialize};

/// CNI plugin type handled by the synthesizer
pub const OVERLAY_CNI_TYPE: &str = "ovn-k8s-cni-overlay";

fn default_cni_version() -> String {
    "0.4.0".to_string()
}

/// CNI configuration embedded in a network attachment definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetConf {
    #[serde(default = "default_cni_version")]
    pub cni_version: String,

    /// Network name; attachments sharing a name share a network
    pub name: String,

    #[serde(rename = "type")]
    pub cni_type: String,

    /// `layer3`, `layer2` or `localnet`
    pub topology: String,

    /// Comma separated CIDRs, optionally with a host subnet length (`10.128.0.0/14/23`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnets: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,

    /// `namespace/name` of the owning attachment definition
    #[serde(default)]
    pub net_attach_def_name: String,

    #[serde(default)]
    pub primary_network: bool,
}

impl NetConf {
    /// Configuration of an overlay network attachment named `namespace/nad_name`
    pub fn new(
        network_name: &str,
        nad_name: &str,
        namespace: &str,
        topology: &str,
        subnets: &str,
        primary_network: bool,
    ) -> Self {
        Self {
            cni_version: default_cni_version(),
            name: network_name.to_string(),
            cni_type: OVERLAY_CNI_TYPE.to_string(),
            topology: topology.to_string(),
            subnets: (!subnets.is_empty()).then(|| subnets.to_string()),
            mtu: Some(1300),
            net_attach_def_name: format!("{}/{}", namespace, nad_name),
            primary_network,
        }
    }

    pub fn from_json(config: &str) -> serde_json::Result<Self> {
        serde_json::from_str(config)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attachment_config() {
        let config = r#"
        {
            "cniVersion": "0.4.0",
            "name": "isolatednet",
            "type": "ovn-k8s-cni-overlay",
            "topology": "layer2",
            "subnets": "100.200.0.0/16",
            "mtu": 1300,
            "netAttachDefName": "ns1/attachment1",
            "primaryNetwork": false
        }"#;
        let conf = NetConf::from_json(config).unwrap();
        assert_eq!(conf.name, "isolatednet");
        assert_eq!(conf.topology, "layer2");
        assert_eq!(conf.subnets.as_deref(), Some("100.200.0.0/16"));
        assert_eq!(conf.net_attach_def_name, "ns1/attachment1");
        assert!(!conf.primary_network);
    }

    #[test]
    fn test_new_round_trips_through_json() {
        let conf = NetConf::new("tenantred", "attachment1", "ns1", "layer3", "192.168.0.0/16/24", true);
        let parsed = NetConf::from_json(&conf.to_json().unwrap()).unwrap();
        assert_eq!(parsed, conf);
        assert_eq!(parsed.cni_type, OVERLAY_CNI_TYPE);
        assert_eq!(parsed.net_attach_def_name, "ns1/attachment1");
    }

    #[test]
    fn test_empty_subnets_are_absent() {
        let conf = NetConf::new("bridged", "attachment1", "ns1", "localnet", "", false);
        assert!(conf.subnets.is_none());
        assert!(!conf.to_json().unwrap().contains("subnets"));
    }
}
