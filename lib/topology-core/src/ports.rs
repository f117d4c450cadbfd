//! Builders for logical switch ports and the ACL guarding management traffic

use crate::addressing::format_mac;
use crate::model::{Network, Pod, PortInfo, Topology};
use crate::naming::{
    self, NAD_EXTERNAL_ID, NETWORK_EXTERNAL_ID, TOPOLOGY_EXTERNAL_ID,
};
use std::collections::BTreeMap;
use std::net::IpAddr;
use topology_api::nbdb::acl::DEFAULT_ALLOW_PRIORITY;
use topology_api::nbdb::{Acl, AclAction, AclDirection, LogicalPortType, LogicalSwitchPort};

/// MAC given to every management port
pub const MANAGEMENT_PORT_MAC: &str = "02:03:04:05:06:07";

/// Link-local identity the cluster router answers ARP/ND with
pub const ARP_PROXY_MAC: &str = "0a:58:a9:fe:01:01";
pub const ARP_PROXY_IPV4: &str = "169.254.1.1";
pub const ARP_PROXY_IPV6: &str = "fe80::1";

/// Address of a router-facing port
pub const ROUTER_ADDRESS: &str = "router";

/// Everything needed to build a pod's port on one attachment
pub struct EndpointSpec<'a> {
    pub network: &'a Network,
    pub pod: &'a Pod,
    pub nad_name: &'a str,
    pub port: &'a PortInfo,
    /// Cluster runs in multi-zone interconnect mode
    pub interconnect: bool,
}

/// A workload port: `"<mac> <ip>"` locked down by port security
pub fn endpoint_port(spec: &EndpointSpec<'_>) -> LogicalSwitchPort {
    let EndpointSpec {
        network,
        pod,
        nad_name,
        port,
        interconnect,
    } = *spec;

    let address = format!("{} {}", format_mac(&port.mac), port.address.ip);

    let mut external_ids = BTreeMap::new();
    external_ids.insert("pod".to_string(), "true".to_string());
    external_ids.insert("namespace".to_string(), pod.namespace.clone());
    external_ids.insert(NETWORK_EXTERNAL_ID.to_string(), network.name.clone());
    external_ids.insert(NAD_EXTERNAL_ID.to_string(), nad_name.to_string());
    external_ids.insert(TOPOLOGY_EXTERNAL_ID.to_string(), network.topology.to_string());

    let mut options = BTreeMap::new();
    options.insert("requested-chassis".to_string(), pod.node.clone());
    if !pod.omit_iface_id_ver {
        options.insert("iface-id-ver".to_string(), pod.name.clone());
    }
    if interconnect && network.topology == Topology::Layer2 {
        options.insert("requested-tnl-key".to_string(), port.tunnel_id.to_string());
    }

    LogicalSwitchPort {
        name: naming::secondary_port_name(&pod.namespace, &pod.name, nad_name),
        addresses: vec![address.clone()],
        external_ids,
        options,
        port_security: vec![address],
        port_type: LogicalPortType::Endpoint,
    }
}

/// `arp_proxy` option value: proxy MAC, proxy IPs, then the network CIDRs
pub fn arp_proxy(network: &Network) -> String {
    let mut parts = vec![
        ARP_PROXY_MAC.to_string(),
        ARP_PROXY_IPV4.to_string(),
        ARP_PROXY_IPV6.to_string(),
    ];
    parts.extend(network.cidrs());
    parts.join(" ")
}

/// Turn an endpoint port into the switch side of the switch/router link of
/// `switch_name`
pub fn switch_to_router_port(
    endpoint: LogicalSwitchPort,
    switch_name: &str,
    network: &Network,
) -> LogicalSwitchPort {
    let mut options = BTreeMap::new();
    options.insert(
        "router-port".to_string(),
        naming::router_to_switch_port_name(switch_name),
    );
    options.insert("arp_proxy".to_string(), arp_proxy(network));

    let mut port = endpoint;
    port.name = naming::switch_to_router_port_name(switch_name);
    port.addresses = vec![ROUTER_ADDRESS.to_string()];
    port.external_ids.clear();
    port.port_security.clear();
    port.options = options;
    port.port_type = LogicalPortType::Router;
    port
}

/// The node's stub on a switch, named after `scope`
pub fn management_port(scope: &str, management_ip: IpAddr) -> LogicalSwitchPort {
    LogicalSwitchPort {
        name: naming::management_port_name(scope),
        addresses: vec![format!("{} {}", MANAGEMENT_PORT_MAC, management_ip)],
        ..Default::default()
    }
}

/// Switch side of the link between a flat network's switch and the gateway
/// router `gw_router_name`
pub fn gateway_join_port(network: &Network, gw_router_name: &str) -> LogicalSwitchPort {
    let mut external_ids = BTreeMap::new();
    external_ids.insert(TOPOLOGY_EXTERNAL_ID.to_string(), network.topology.to_string());
    external_ids.insert(NETWORK_EXTERNAL_ID.to_string(), network.name.clone());

    let mut options = BTreeMap::new();
    options.insert(
        "router-port".to_string(),
        naming::gw_router_to_join_switch_port_name(gw_router_name),
    );

    LogicalSwitchPort {
        name: naming::join_switch_to_gw_router_port_name(gw_router_name),
        addresses: vec![ROUTER_ADDRESS.to_string()],
        external_ids,
        options,
        port_security: Vec::new(),
        port_type: LogicalPortType::Router,
    }
}

/// Allow all traffic sourced from the management address of
/// `management_port` on `switch_name`
pub fn allow_from_management(switch_name: &str, management_port: &str, management_ip: IpAddr) -> Acl {
    let family = if management_ip.is_ipv4() { "ip4" } else { "ip6" };

    let mut external_ids = BTreeMap::new();
    external_ids.insert("k8s.ovn.org/owner-type".to_string(), "NetpolNode".to_string());
    external_ids.insert("k8s.ovn.org/name".to_string(), switch_name.to_string());
    external_ids.insert("ip".to_string(), management_ip.to_string());

    Acl {
        name: naming::management_acl_name(management_port),
        direction: AclDirection::ToLport,
        priority: DEFAULT_ALLOW_PRIORITY,
        match_expr: format!("{}.src=={}", family, management_ip),
        action: AclAction::AllowRelated,
        external_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NetworkRole, Subnet};
    use mac_address::MacAddress;

    fn layer3_network() -> Network {
        let subnet: Subnet = "10.128.0.0/14/23".parse().unwrap();
        Network::new("isolatednet", Topology::Layer3, vec![subnet], NetworkRole::Secondary)
    }

    fn port_info() -> PortInfo {
        PortInfo {
            address: "10.128.1.3/23".parse().unwrap(),
            mac: MacAddress::new([0x0a, 0x58, 0x0a, 0x80, 0x01, 0x03]),
            tunnel_id: 1,
        }
    }

    #[test]
    fn test_endpoint_port() {
        let network = layer3_network();
        let pod = Pod::new("ns1", "myPod", "test-node");
        let info = port_info();
        let port = endpoint_port(&EndpointSpec {
            network: &network,
            pod: &pod,
            nad_name: "ns1/attachment1",
            port: &info,
            interconnect: false,
        });

        assert_eq!(port.name, "ns1.attachment1_ns1_myPod");
        assert_eq!(port.addresses, vec!["0a:58:0a:80:01:03 10.128.1.3".to_string()]);
        assert_eq!(port.port_security, port.addresses);
        assert_eq!(port.external_ids["pod"], "true");
        assert_eq!(port.external_ids["namespace"], "ns1");
        assert_eq!(port.external_ids[NETWORK_EXTERNAL_ID], "isolatednet");
        assert_eq!(port.external_ids[NAD_EXTERNAL_ID], "ns1/attachment1");
        assert_eq!(port.external_ids[TOPOLOGY_EXTERNAL_ID], "layer3");
        assert_eq!(port.options["requested-chassis"], "test-node");
        assert_eq!(port.options["iface-id-ver"], "myPod");
        assert!(!port.options.contains_key("requested-tnl-key"));
        assert_eq!(port.port_type, LogicalPortType::Endpoint);
    }

    #[test]
    fn test_endpoint_port_without_iface_id_ver() {
        let network = layer3_network();
        let mut pod = Pod::new("ns1", "myPod", "test-node");
        pod.omit_iface_id_ver = true;
        let info = port_info();
        let port = endpoint_port(&EndpointSpec {
            network: &network,
            pod: &pod,
            nad_name: "ns1/attachment1",
            port: &info,
            interconnect: false,
        });
        assert!(!port.options.contains_key("iface-id-ver"));
    }

    #[test]
    fn test_layer2_interconnect_requests_tunnel_key() {
        let network = Network::new("flat", Topology::Layer2, vec![], NetworkRole::Secondary);
        let pod = Pod::new("ns1", "myPod", "test-node");
        let mut info = port_info();
        info.tunnel_id = 7;
        let spec = EndpointSpec {
            network: &network,
            pod: &pod,
            nad_name: "ns1/attachment1",
            port: &info,
            interconnect: true,
        };
        assert_eq!(endpoint_port(&spec).options["requested-tnl-key"], "7");
    }

    #[test]
    fn test_switch_to_router_port() {
        let network = layer3_network();
        let pod = Pod::new("ns1", "myPod", "test-node");
        let info = port_info();
        let endpoint = endpoint_port(&EndpointSpec {
            network: &network,
            pod: &pod,
            nad_name: "ns1/attachment1",
            port: &info,
            interconnect: false,
        });
        let port = switch_to_router_port(endpoint, "isolatednet_test-node", &network);

        assert_eq!(port.name, "stor-isolatednet_test-node");
        assert_eq!(port.addresses, vec!["router".to_string()]);
        assert!(port.external_ids.is_empty());
        assert!(port.port_security.is_empty());
        assert_eq!(port.port_type, LogicalPortType::Router);
        assert_eq!(port.options["router-port"], "rtos-isolatednet_test-node");
        assert_eq!(
            port.options["arp_proxy"],
            "0a:58:a9:fe:01:01 169.254.1.1 fe80::1 10.128.0.0/14"
        );
    }

    #[test]
    fn test_management_port() {
        let port = management_port("isolatednet_test-node", "10.128.0.2".parse().unwrap());
        assert_eq!(port.name, "k8s-isolatednet_test-node");
        assert_eq!(port.addresses, vec!["02:03:04:05:06:07 10.128.0.2".to_string()]);
        assert!(port.external_ids.is_empty());
        assert!(port.options.is_empty());
    }

    #[test]
    fn test_gateway_join_port() {
        let network = Network::new("flat", Topology::Layer2, vec![], NetworkRole::Secondary);
        let port = gateway_join_port(&network, "GR_flat_node1");
        assert_eq!(port.name, "jtor-GR_flat_node1");
        assert_eq!(port.addresses, vec!["router".to_string()]);
        assert_eq!(port.options["router-port"], "rtoj-GR_flat_node1");
        assert_eq!(port.external_ids[TOPOLOGY_EXTERNAL_ID], "layer2");
        assert_eq!(port.external_ids[NETWORK_EXTERNAL_ID], "flat");
        assert_eq!(port.port_type, LogicalPortType::Router);
    }

    #[test]
    fn test_allow_from_management() {
        let acl = allow_from_management("net_node1", "k8s-net_node1", "10.128.0.2".parse().unwrap());
        assert_eq!(acl.name, "k8s-net_node1-allow-from-mgmt");
        assert_eq!(acl.match_expr, "ip4.src==10.128.0.2");
        assert_eq!(acl.action, AclAction::AllowRelated);
        assert_eq!(acl.priority, DEFAULT_ALLOW_PRIORITY);

        let acl = allow_from_management("net_node1", "k8s-net_node1", "fd10::2".parse().unwrap());
        assert_eq!(acl.match_expr, "ip6.src==fd10::2");
    }
}
