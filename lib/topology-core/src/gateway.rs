//! Gateway router side of a network
//!
//! Pure constructors: nothing here looks at live state.

use crate::addressing::{format_mac, ip_to_mac};
use crate::model::{GatewayConfig, Network};
use crate::naming::{self, NETWORK_EXTERNAL_ID, TOPOLOGY_EXTERNAL_ID};
use ipnetwork::IpNetwork;
use std::collections::BTreeMap;
use topology_api::nbdb::{LogicalRouter, LogicalRouterPort, LogicalSwitch, ObjectKey};

/// Gateway router of `node` on `network`
pub fn gateway_router_name(network: &Network, node: &str) -> String {
    format!("{}{}", naming::GW_ROUTER_PREFIX, network.scoped_name(node))
}

/// Primary external address of the node, empty when none is configured
pub fn host_physical_ip(gw: &GatewayConfig) -> String {
    gw.ip_addresses
        .first()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default()
}

/// External addresses followed by the join address
pub fn host_ips(gw: &GatewayConfig) -> Vec<String> {
    gw.ip_addresses
        .iter()
        .chain(std::iter::once(&gw.join_address))
        .map(|addr| addr.ip().to_string())
        .collect()
}

pub fn gateway_router_external_ids(network: &Network, gw: &GatewayConfig) -> BTreeMap<String, String> {
    let mut ids = BTreeMap::new();
    ids.insert(NETWORK_EXTERNAL_ID.to_string(), network.name.clone());
    ids.insert(TOPOLOGY_EXTERNAL_ID.to_string(), network.topology.to_string());
    ids.insert("physical_ip".to_string(), host_physical_ip(gw));
    ids.insert("physical_ips".to_string(), host_ips(gw).join(","));
    ids
}

/// Gateway router of `node`, owning its join-side router port
pub fn gateway_router(network: &Network, node: &str, gw: &GatewayConfig) -> LogicalRouter {
    let name = gateway_router_name(network, node);

    let mut options = BTreeMap::new();
    if !gw.chassis_id.is_empty() {
        options.insert("chassis".to_string(), gw.chassis_id.clone());
    }
    options.insert("always_learn_from_arp_request".to_string(), "false".to_string());
    options.insert("dynamic_neigh_routers".to_string(), "true".to_string());

    let port = ObjectKey::for_name(&naming::gw_router_to_join_switch_port_name(&name));
    LogicalRouter {
        name,
        ports: vec![port],
        options,
        external_ids: gateway_router_external_ids(network, gw),
    }
}

/// Router side of the gateway router's link toward the cluster
pub fn gateway_router_port(gw_router_name: &str, networks: &[IpNetwork]) -> LogicalRouterPort {
    LogicalRouterPort {
        name: naming::gw_router_to_join_switch_port_name(gw_router_name),
        mac: networks
            .first()
            .map(|net| format_mac(&ip_to_mac(net.ip())))
            .unwrap_or_default(),
        networks: networks.iter().map(|net| net.to_string()).collect(),
    }
}

/// Switch joining the cluster router to every gateway router of a routed network
pub fn join_switch(network: &Network) -> LogicalSwitch {
    let mut external_ids = BTreeMap::new();
    external_ids.insert(NETWORK_EXTERNAL_ID.to_string(), network.name.clone());
    LogicalSwitch {
        name: network.scoped_name(naming::JOIN_SWITCH),
        external_ids,
        ..Default::default()
    }
}

/// Router interconnecting the per-node switches of a routed network
pub fn cluster_router(network: &Network) -> LogicalRouter {
    let mut external_ids = BTreeMap::new();
    external_ids.insert(NETWORK_EXTERNAL_ID.to_string(), network.name.clone());
    external_ids.insert(TOPOLOGY_EXTERNAL_ID.to_string(), network.topology.to_string());
    LogicalRouter {
        name: network.scoped_name(naming::CLUSTER_ROUTER),
        external_ids,
        ..Default::default()
    }
}

/// Cluster router port facing `switch_name`, owning the node gateway address
pub fn cluster_router_port(switch_name: &str, gateway: IpNetwork) -> LogicalRouterPort {
    LogicalRouterPort {
        name: naming::router_to_switch_port_name(switch_name),
        mac: format_mac(&ip_to_mac(gateway.ip())),
        networks: vec![gateway.to_string()],
    }
}
