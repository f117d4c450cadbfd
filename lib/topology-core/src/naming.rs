//! Naming conventions shared with every consumer of the northbound database
//!
//! These strings are matched bit for bit by other components; changing any
//! of them orphans objects created by earlier passes.

/// Name of the cluster default network; its objects carry no network prefix
pub const DEFAULT_NETWORK: &str = "default";

pub const SWITCH_TO_ROUTER_PREFIX: &str = "stor-";
pub const ROUTER_TO_SWITCH_PREFIX: &str = "rtos-";
pub const MANAGEMENT_PORT_PREFIX: &str = "k8s-";
pub const GW_ROUTER_PREFIX: &str = "GR_";
pub const JOIN_SWITCH_TO_GW_ROUTER_PREFIX: &str = "jtor-";
pub const GW_ROUTER_TO_JOIN_SWITCH_PREFIX: &str = "rtoj-";
pub const TRANSIT_SWITCH_SUFFIX: &str = "_transit_switch";

pub const LAYER2_SWITCH: &str = "ovn_layer2_switch";
pub const LOCALNET_SWITCH: &str = "ovn_localnet_switch";
pub const JOIN_SWITCH: &str = "join";
pub const CLUSTER_ROUTER: &str = "ovn_cluster_router";

/// External ID keys
pub const NETWORK_EXTERNAL_ID: &str = "k8s.ovn.org/network";
pub const NAD_EXTERNAL_ID: &str = "k8s.ovn.org/nad";
pub const TOPOLOGY_EXTERNAL_ID: &str = "k8s.ovn.org/topology";

/// Prefix scoping object names to a network: `-` and `/` become `.`,
/// followed by `_`
pub fn network_prefix(network_name: &str) -> String {
    let mut prefix = network_name.replace(['-', '/'], ".");
    prefix.push('_');
    prefix
}

/// `name` scoped to `network_name`; the default network is unscoped
pub fn network_scoped_name(network_name: &str, name: &str) -> String {
    if network_name == DEFAULT_NETWORK {
        name.to_string()
    } else {
        format!("{}{}", network_prefix(network_name), name)
    }
}

/// Logical port name of a pod's interface on a secondary network attachment
pub fn secondary_port_name(namespace: &str, pod_name: &str, nad_name: &str) -> String {
    format!("{}{}_{}", network_prefix(nad_name), namespace, pod_name)
}

pub fn switch_to_router_port_name(switch_name: &str) -> String {
    format!("{}{}", SWITCH_TO_ROUTER_PREFIX, switch_name)
}

pub fn router_to_switch_port_name(switch_name: &str) -> String {
    format!("{}{}", ROUTER_TO_SWITCH_PREFIX, switch_name)
}

pub fn management_port_name(scope: &str) -> String {
    format!("{}{}", MANAGEMENT_PORT_PREFIX, scope)
}

pub fn join_switch_to_gw_router_port_name(gw_router_name: &str) -> String {
    format!("{}{}", JOIN_SWITCH_TO_GW_ROUTER_PREFIX, gw_router_name)
}

pub fn gw_router_to_join_switch_port_name(gw_router_name: &str) -> String {
    format!("{}{}", GW_ROUTER_TO_JOIN_SWITCH_PREFIX, gw_router_name)
}

pub fn transit_switch_name(network_name: &str) -> String {
    format!("{}{}", network_name, TRANSIT_SWITCH_SUFFIX)
}

/// Name of the ACL admitting traffic from the management port `management_port`
pub fn management_acl_name(management_port: &str) -> String {
    format!("{}-allow-from-mgmt", management_port)
}
