//! Input model: networks, pods and their attachments, gateway configuration

use crate::naming;
use crate::{CoreError, Result};
use crate::addressing::format_mac;
use ipnetwork::{IpNetwork, Ipv4Network};
use mac_address::MacAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use topology_api::netconf::OVERLAY_CNI_TYPE;
use topology_api::NetConf;

/// Shape of the logical topology realizing a network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// One switch per node joined by a cluster router
    Layer3,
    /// One switch spanning every node
    Layer2,
    /// One switch bridged onto a physical network
    Localnet,
}

impl Topology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Layer3 => "layer3",
            Topology::Layer2 => "layer2",
            Topology::Localnet => "localnet",
        }
    }
}

impl FromStr for Topology {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "layer3" => Ok(Topology::Layer3),
            "layer2" => Ok(Topology::Layer2),
            "localnet" => Ok(Topology::Localnet),
            other => Err(CoreError::UnsupportedTopology(other.to_string())),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkRole {
    Primary,
    #[default]
    Secondary,
}

impl NetworkRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkRole::Primary => "primary",
            NetworkRole::Secondary => "secondary",
        }
    }
}

/// A network CIDR, optionally carved into per-node subnets of `host_prefix` bits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subnet {
    pub cidr: IpNetwork,
    pub host_prefix: Option<u8>,
}

impl FromStr for Subnet {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || CoreError::InvalidSubnet(s.to_string());

        let (cidr, host_prefix) = if s.matches('/').count() == 2 {
            let (cidr, host) = s.rsplit_once('/').ok_or_else(invalid)?;
            let host: u8 = host.parse().map_err(|_| invalid())?;
            (cidr, Some(host))
        } else {
            (s, None)
        };

        let cidr: IpNetwork = cidr.parse().map_err(|_| invalid())?;
        if let Some(host) = host_prefix {
            let max = if cidr.is_ipv4() { 32 } else { 128 };
            if host < cidr.prefix() || host > max {
                return Err(invalid());
            }
        }
        // Normalize to the network address so `10.128.0.5/14` keys like `10.128.0.0/14`
        let cidr = IpNetwork::new(cidr.network(), cidr.prefix()).map_err(|_| invalid())?;
        Ok(Self { cidr, host_prefix })
    }
}

impl TryFrom<String> for Subnet {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Subnet> for String {
    fn from(value: Subnet) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host_prefix {
            Some(host) => write!(f, "{}/{}", self.cidr, host),
            None => write!(f, "{}", self.cidr),
        }
    }
}

/// Parse a comma separated subnet list, skipping blank entries
pub fn parse_subnets(list: &str) -> Result<Vec<Subnet>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(Subnet::from_str)
        .collect()
}

/// A network pods attach to, validated from its attachment configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    pub name: String,
    pub topology: Topology,
    pub subnets: Vec<Subnet>,
    pub role: NetworkRole,
}

impl Network {
    pub fn new(name: &str, topology: Topology, subnets: Vec<Subnet>, role: NetworkRole) -> Self {
        Self {
            name: name.to_string(),
            topology,
            subnets,
            role,
        }
    }

    /// `name` scoped to this network
    pub fn scoped_name(&self, name: &str) -> String {
        naming::network_scoped_name(&self.name, name)
    }

    pub fn first_subnet(&self) -> Option<&Subnet> {
        self.subnets.first()
    }

    /// Network CIDRs in declaration order
    pub fn cidrs(&self) -> Vec<String> {
        self.subnets.iter().map(|s| s.cidr.to_string()).collect()
    }
}

impl TryFrom<&NetConf> for Network {
    type Error = CoreError;

    fn try_from(conf: &NetConf) -> Result<Self> {
        if conf.cni_type != OVERLAY_CNI_TYPE {
            return Err(CoreError::InvalidConfiguration(format!(
                "network {} has unsupported CNI type {}",
                conf.name, conf.cni_type
            )));
        }
        if conf.name.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "network name must not be empty".to_string(),
            ));
        }

        let topology: Topology = conf.topology.parse()?;
        let subnets = match conf.subnets.as_deref() {
            Some(list) => parse_subnets(list)?,
            None => Vec::new(),
        };
        if topology == Topology::Layer3 && subnets.is_empty() {
            return Err(CoreError::InvalidConfiguration(format!(
                "layer3 network {} requires at least one subnet",
                conf.name
            )));
        }

        let role = if conf.primary_network {
            NetworkRole::Primary
        } else {
            NetworkRole::Secondary
        };

        Ok(Self {
            name: conf.name.clone(),
            topology,
            subnets,
            role,
        })
    }
}

/// A pod address with the prefix length it was allocated with, if known
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PodAddress {
    pub ip: IpAddr,
    pub prefix_len: Option<u8>,
}

impl FromStr for PodAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.contains('/') {
            let net: IpNetwork = s
                .parse()
                .map_err(|_| CoreError::InvalidAddress(s.to_string()))?;
            Ok(Self {
                ip: net.ip(),
                prefix_len: Some(net.prefix()),
            })
        } else {
            let ip: IpAddr = s
                .parse()
                .map_err(|_| CoreError::InvalidAddress(s.to_string()))?;
            Ok(Self { ip, prefix_len: None })
        }
    }
}

impl TryFrom<String> for PodAddress {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PodAddress> for String {
    fn from(value: PodAddress) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PodAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix_len {
            Some(len) => write!(f, "{}/{}", self.ip, len),
            None => write!(f, "{}", self.ip),
        }
    }
}

/// Addressing of one pod interface on one attachment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub address: PodAddress,
    #[serde(with = "mac_text")]
    pub mac: MacAddress,
    pub tunnel_id: u32,
}

/// MACs travel as colon separated lowercase hex
mod mac_text {
    use super::format_mac;
    use mac_address::MacAddress;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(mac: &MacAddress, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_mac(mac))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MacAddress, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Everything known about a pod on one network
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodNetworkInfo {
    /// Subnet of the pod's node on this network, when allocated per node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_subnet: Option<IpNetwork>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_ip: Option<IpAddr>,

    #[serde(default)]
    pub role: NetworkRole,

    /// Interfaces keyed by attachment name
    #[serde(default)]
    pub ports: BTreeMap<String, PortInfo>,
}

impl PodNetworkInfo {
    pub fn new(role: NetworkRole) -> Self {
        Self {
            role,
            ..Default::default()
        }
    }
}

/// A scheduled pod and its network attachments
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub namespace: String,
    pub name: String,
    pub node: String,

    /// Leave the interface-version option off this pod's ports
    #[serde(default)]
    pub omit_iface_id_ver: bool,

    /// Attachments keyed by network name
    #[serde(default)]
    pub networks: BTreeMap<String, PodNetworkInfo>,
}

impl Pod {
    pub fn new(namespace: &str, name: &str, node: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            node: node.to_string(),
            omit_iface_id_ver: false,
            networks: BTreeMap::new(),
        }
    }

    /// Attach an interface through `nad_name` to `network_name`
    pub fn add_port(
        &mut self,
        network_name: &str,
        role: NetworkRole,
        nad_name: &str,
        port: PortInfo,
    ) -> &mut PodNetworkInfo {
        let info = self
            .networks
            .entry(network_name.to_string())
            .or_insert_with(|| PodNetworkInfo::new(role));
        info.ports.insert(nad_name.to_string(), port);
        info
    }

    pub fn network(&self, network_name: &str) -> Option<&PodNetworkInfo> {
        self.networks.get(network_name)
    }

    pub fn port(&self, network_name: &str, nad_name: &str) -> Option<&PortInfo> {
        self.network(network_name)?.ports.get(nad_name)
    }
}

const DEFAULT_JOIN_IP: Ipv4Addr = Ipv4Addr::new(100, 65, 0, 4);

fn default_join_address() -> IpNetwork {
    let join = Ipv4Network::new(DEFAULT_JOIN_IP, 16).unwrap_or_else(|_| Ipv4Network::from(DEFAULT_JOIN_IP));
    IpNetwork::V4(join)
}

/// Node gateway configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// External-facing addresses, the first being the primary one
    pub ip_addresses: Vec<IpNetwork>,

    #[serde(default)]
    pub chassis_id: String,

    /// Cluster-internal address of the gateway router on the join network
    #[serde(default = "default_join_address")]
    pub join_address: IpNetwork,
}

impl GatewayConfig {
    pub fn new(ip_addresses: Vec<IpNetwork>) -> Self {
        Self {
            ip_addresses,
            chassis_id: String::new(),
            join_address: default_join_address(),
        }
    }
}
