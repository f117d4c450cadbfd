//! Topology synthesis
//!
//! Maps networks and the pods attached to them onto the logical switches,
//! ports, routers and ACLs realizing them. Each network is one topology for
//! its whole lifetime, so the shape is chosen once per network:
//! - layer3: a switch per node, each linked to the cluster router
//! - layer2: one switch shared by every node
//! - localnet: one switch bridged to the physical network, endpoints only
//!
//! Synthesis is a pure function of its inputs. Node-level objects are
//! emitted once per node no matter how many pods run there. Two different
//! objects claiming the same name fail the pass with
//! [`CoreError::ObjectConflict`].

use crate::addressing::{NodeAddressing, SequentialAddressing};
use crate::gateway;
use crate::model::{GatewayConfig, Network, Pod, PodNetworkInfo, Topology};
use crate::naming::{self, NETWORK_EXTERNAL_ID};
use crate::object_set::ObjectSet;
use crate::ports::{self, EndpointSpec};
use crate::{CoreError, Result};
use ipnetwork::IpNetwork;
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use topology_api::nbdb::{Acl, LogicalRouter, LogicalSwitch, LogicalSwitchPort, ObjectKey};
use tracing::{debug, info, warn};

/// Tunnel key reserved for transit switches, outside the range handed to
/// per-node switches
pub const TRANSIT_SWITCH_TUNNEL_KEY: u32 = 16711685;

/// Cluster-wide switches for a synthesis pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SynthesisConfig {
    /// Provision gateway routers, management ports and their ACLs
    pub gateway: Option<GatewayConfig>,
    /// The cluster federates zones through transit switches
    pub interconnect: bool,
}

/// Computes the desired logical topology of a set of networks
#[derive(Clone, Debug)]
pub struct Synthesizer<A = SequentialAddressing> {
    config: SynthesisConfig,
    addressing: A,
}

impl Synthesizer<SequentialAddressing> {
    pub fn new(config: SynthesisConfig) -> Self {
        Self::with_addressing(config, SequentialAddressing)
    }
}

impl<A: NodeAddressing> Synthesizer<A> {
    pub fn with_addressing(config: SynthesisConfig, addressing: A) -> Self {
        Self { config, addressing }
    }

    /// Objects for every network in `networks`
    pub fn synthesize(&self, networks: &[Network], pods: &[Pod]) -> Result<ObjectSet> {
        let mut objects = ObjectSet::new();
        for network in networks {
            objects.extend(self.synthesize_network(network, pods)?)?;
        }
        Ok(objects)
    }

    /// Objects realizing `network` for the pods attached to it
    pub fn synthesize_network(&self, network: &Network, pods: &[Pod]) -> Result<ObjectSet> {
        let mut pass = Pass::new(network);

        for pod in pods {
            let Some(info) = pod.network(&network.name) else {
                continue;
            };
            match network.topology {
                Topology::Layer3 => self.layer3_pod(&mut pass, pod, info)?,
                Topology::Layer2 => self.layer2_pod(&mut pass, pod, info)?,
                Topology::Localnet => self.localnet_pod(&mut pass, pod, info)?,
            }
        }

        if self.config.interconnect && network.topology == Topology::Layer3 {
            pass.add_switch(Role::TransitSwitch, transit_switch(network))?;
        }

        let objects = pass.finish()?;
        info!(
            "Synthesized {} objects for {} network {}",
            objects.len(),
            network.topology,
            network.name
        );
        Ok(objects)
    }

    fn layer3_pod(&self, pass: &mut Pass<'_>, pod: &Pod, info: &PodNetworkInfo) -> Result<()> {
        let network = pass.network;
        let switch_name = network.scoped_name(&pod.node);
        let subnet = info
            .node_subnet
            .or_else(|| network.first_subnet().map(|s| s.cidr));
        let management_ip = self.management_ip(subnet.as_ref(), info);

        pass.switch(
            Role::NodeSwitch,
            &switch_name,
            other_config(subnet.as_ref(), management_ip),
        )?;

        for (nad_name, port) in &info.ports {
            let endpoint = ports::endpoint_port(&EndpointSpec {
                network,
                pod,
                nad_name,
                port,
                interconnect: self.config.interconnect,
            });

            if pass.visit_node(&pod.node) {
                debug!("Wiring node {} into network {}", pod.node, network.name);
                let stor = ports::switch_to_router_port(endpoint.clone(), &switch_name, network);
                pass.attach(&switch_name, stor)?;

                if let Some(gw) = &self.config.gateway {
                    self.management_access(pass, &switch_name, &switch_name, management_ip)?;
                    self.layer3_gateway(pass, &pod.node, &switch_name, subnet.as_ref(), gw)?;
                }
            }

            pass.attach(&switch_name, endpoint)?;
        }
        Ok(())
    }

    fn layer2_pod(&self, pass: &mut Pass<'_>, pod: &Pod, info: &PodNetworkInfo) -> Result<()> {
        let network = pass.network;
        let switch_name = network.scoped_name(naming::LAYER2_SWITCH);
        let subnet = network.first_subnet().map(|s| s.cidr);

        // flat switches carry no subnet config
        pass.switch(Role::SharedSwitch, &switch_name, None)?;

        for (nad_name, port) in &info.ports {
            let endpoint = ports::endpoint_port(&EndpointSpec {
                network,
                pod,
                nad_name,
                port,
                interconnect: self.config.interconnect,
            });

            if let Some(gw) = &self.config.gateway {
                if pass.visit_node(&pod.node) {
                    debug!("Wiring node {} into network {}", pod.node, network.name);
                    self.layer2_gateway(pass, &pod.node, &switch_name, subnet.as_ref(), info, gw)?;
                }
            }

            pass.attach(&switch_name, endpoint)?;
        }
        Ok(())
    }

    fn localnet_pod(&self, pass: &mut Pass<'_>, pod: &Pod, info: &PodNetworkInfo) -> Result<()> {
        let network = pass.network;
        let switch_name = network.scoped_name(naming::LOCALNET_SWITCH);
        let subnet = network.first_subnet().map(|s| s.cidr);
        let management_ip = self.management_ip(subnet.as_ref(), info);

        pass.switch(
            Role::SharedSwitch,
            &switch_name,
            other_config(subnet.as_ref(), management_ip),
        )?;

        for (nad_name, port) in &info.ports {
            let endpoint = ports::endpoint_port(&EndpointSpec {
                network,
                pod,
                nad_name,
                port,
                interconnect: self.config.interconnect,
            });
            pass.attach(&switch_name, endpoint)?;
        }
        Ok(())
    }

    /// Management port of `scope` plus the ACL admitting its traffic on `switch_name`
    fn management_access(
        &self,
        pass: &mut Pass<'_>,
        switch_name: &str,
        scope: &str,
        management_ip: Option<IpAddr>,
    ) -> Result<()> {
        let Some(ip) = management_ip else {
            warn!(
                "No management address for switch {} on network {}, skipping management port",
                switch_name, pass.network.name
            );
            return Ok(());
        };
        let port = ports::management_port(scope, ip);
        let acl = ports::allow_from_management(switch_name, &port.name, ip);
        pass.attach(switch_name, port)?;
        pass.apply_acl(switch_name, acl)
    }

    fn layer3_gateway(
        &self,
        pass: &mut Pass<'_>,
        node: &str,
        switch_name: &str,
        subnet: Option<&IpNetwork>,
        gw: &GatewayConfig,
    ) -> Result<()> {
        let network = pass.network;
        let gw_router_name = gateway::gateway_router_name(network, node);

        pass.objects
            .insert(gateway::gateway_router_port(&gw_router_name, &[gw.join_address]))?;
        pass.router(Role::GatewayRouter, gateway::gateway_router(network, node, gw))?;

        let join = gateway::join_switch(network);
        let join_name = join.name.clone();
        pass.add_switch(Role::JoinSwitch, join)?;
        pass.attach(&join_name, ports::gateway_join_port(network, &gw_router_name))?;

        let cluster_router = gateway::cluster_router(network);
        let cluster_router_name = cluster_router.name.clone();
        pass.router(Role::ClusterRouter, cluster_router)?;
        match subnet.and_then(|s| self.addressing.gateway_address(s)) {
            Some(gateway_address) => {
                let port = gateway::cluster_router_port(switch_name, gateway_address);
                pass.router_port(&cluster_router_name, port.key());
                pass.objects.insert(port)?;
            }
            None => warn!(
                "No gateway address for switch {} on network {}, skipping cluster router port",
                switch_name, network.name
            ),
        }
        Ok(())
    }

    /// Management port, join port and gateway router of `node` on a flat network
    fn layer2_gateway(
        &self,
        pass: &mut Pass<'_>,
        node: &str,
        switch_name: &str,
        subnet: Option<&IpNetwork>,
        info: &PodNetworkInfo,
        gw: &GatewayConfig,
    ) -> Result<()> {
        let network = pass.network;
        let management_ip = self.management_ip(subnet, info);
        let scope = network.scoped_name(node);
        let gw_router_name = gateway::gateway_router_name(network, node);

        if let Some(ip) = management_ip {
            pass.attach(switch_name, ports::management_port(&scope, ip))?;
        }
        pass.attach(switch_name, ports::gateway_join_port(network, &gw_router_name))?;
        match management_ip {
            Some(ip) => {
                let acl = ports::allow_from_management(
                    switch_name,
                    &naming::management_port_name(&scope),
                    ip,
                );
                pass.apply_acl(switch_name, acl)?;
            }
            None => warn!(
                "No management address for node {} on network {}, skipping management port",
                node, network.name
            ),
        }

        let mut router_networks: Vec<IpNetwork> = network
            .subnets
            .iter()
            .filter_map(|s| self.addressing.gateway_address(&s.cidr))
            .collect();
        if router_networks.is_empty() {
            router_networks.push(gw.join_address);
        }
        pass.objects
            .insert(gateway::gateway_router_port(&gw_router_name, &router_networks))?;
        pass.router(Role::GatewayRouter, gateway::gateway_router(network, node, gw))
    }

    /// Management address the pod's node uses on `subnet`, as reported by
    /// the pod or derived from the subnet
    fn management_ip(&self, subnet: Option<&IpNetwork>, info: &PodNetworkInfo) -> Option<IpAddr> {
        info.management_ip.or_else(|| {
            subnet
                .and_then(|s| self.addressing.management_address(s))
                .map(|addr| addr.ip())
        })
    }
}

/// `subnet` / `exclude_ips` of a switch, when a subnet is known
fn other_config(subnet: Option<&IpNetwork>, management_ip: Option<IpAddr>) -> Option<BTreeMap<String, String>> {
    let subnet = subnet?;
    let mut config = BTreeMap::new();
    config.insert("subnet".to_string(), subnet.to_string());
    if let Some(ip) = management_ip {
        config.insert("exclude_ips".to_string(), ip.to_string());
    }
    Some(config)
}

/// The switch federating a routed network across zones
fn transit_switch(network: &Network) -> LogicalSwitch {
    let name = naming::transit_switch_name(&network.name);
    let mut config = BTreeMap::new();
    config.insert("mcast_querier".to_string(), "false".to_string());
    config.insert("mcast_flood_unregistered".to_string(), "true".to_string());
    config.insert("interconn-ts".to_string(), name.clone());
    config.insert("requested-tnl-key".to_string(), TRANSIT_SWITCH_TUNNEL_KEY.to_string());
    config.insert("mcast_snoop".to_string(), "true".to_string());
    LogicalSwitch {
        name,
        other_config: Some(config),
        ..Default::default()
    }
}

/// What a switch or router stands for within one network
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    NodeSwitch,
    SharedSwitch,
    JoinSwitch,
    TransitSwitch,
    GatewayRouter,
    ClusterRouter,
}

/// Accumulated state of one network's synthesis
struct Pass<'a> {
    network: &'a Network,
    objects: ObjectSet,
    switches: BTreeMap<String, (Role, LogicalSwitch)>,
    routers: BTreeMap<String, (Role, LogicalRouter)>,
    wired_nodes: BTreeSet<String>,
}

impl<'a> Pass<'a> {
    fn new(network: &'a Network) -> Self {
        Self {
            network,
            objects: ObjectSet::new(),
            switches: BTreeMap::new(),
            routers: BTreeMap::new(),
            wired_nodes: BTreeSet::new(),
        }
    }

    /// Make sure the switch `name` exists with `role`
    fn switch(
        &mut self,
        role: Role,
        name: &str,
        other_config: Option<BTreeMap<String, String>>,
    ) -> Result<()> {
        let mut external_ids = BTreeMap::new();
        external_ids.insert(NETWORK_EXTERNAL_ID.to_string(), self.network.name.clone());
        self.add_switch(
            role,
            LogicalSwitch {
                name: name.to_string(),
                other_config,
                external_ids,
                ..Default::default()
            },
        )
    }

    /// Add `switch` unless a switch with its name and role already exists
    fn add_switch(&mut self, role: Role, switch: LogicalSwitch) -> Result<()> {
        match self.switches.get(&switch.name) {
            Some((existing, _)) if *existing == role => Ok(()),
            Some((existing, _)) => Err(role_conflict(&switch.name, *existing, role)),
            None => {
                self.switches.insert(switch.name.clone(), (role, switch));
                Ok(())
            }
        }
    }

    /// Make sure `router` exists with `role`, keeping ports already added to it
    fn router(&mut self, role: Role, router: LogicalRouter) -> Result<()> {
        match self.routers.get(&router.name) {
            Some((existing, _)) if *existing == role => Ok(()),
            Some((existing, _)) => Err(role_conflict(&router.name, *existing, role)),
            None => {
                self.routers.insert(router.name.clone(), (role, router));
                Ok(())
            }
        }
    }

    /// True the first time `node` is seen in this pass
    fn visit_node(&mut self, node: &str) -> bool {
        self.wired_nodes.insert(node.to_string())
    }

    fn attach(&mut self, switch_name: &str, port: LogicalSwitchPort) -> Result<()> {
        let key = port.key();
        self.objects.insert(port)?;
        if let Some((_, switch)) = self.switches.get_mut(switch_name) {
            switch.add_port(key);
        }
        Ok(())
    }

    fn apply_acl(&mut self, switch_name: &str, acl: Acl) -> Result<()> {
        let key = acl.key();
        self.objects.insert(acl)?;
        if let Some((_, switch)) = self.switches.get_mut(switch_name) {
            switch.add_acl(key);
        }
        Ok(())
    }

    fn router_port(&mut self, router_name: &str, port: ObjectKey) {
        if let Some((_, router)) = self.routers.get_mut(router_name) {
            router.add_port(port);
        }
    }

    fn finish(mut self) -> Result<ObjectSet> {
        for (_, switch) in self.switches.into_values() {
            self.objects.insert(switch)?;
        }
        for (_, router) in self.routers.into_values() {
            self.objects.insert(router)?;
        }
        Ok(self.objects)
    }
}

fn role_conflict(name: &str, existing: Role, requested: Role) -> CoreError {
    CoreError::ObjectConflict(format!("{} ({:?} and {:?})", name, existing, requested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::{derive_identifiers, ip_to_mac};
    use crate::model::{NetworkRole, PodAddress, PortInfo};
    use topology_api::nbdb::{LogicalPortType, NbObject};

    fn network(name: &str, topology: Topology, subnets: &str) -> Network {
        Network::new(
            name,
            topology,
            crate::model::parse_subnets(subnets).unwrap(),
            NetworkRole::Secondary,
        )
    }

    fn pod(name: &str, node: &str, network: &Network, nad: &str, ip: &str, tunnel_id: u32) -> Pod {
        let mut pod = Pod::new("ns1", name, node);
        let address: PodAddress = ip.parse().unwrap();
        pod.add_port(
            &network.name,
            NetworkRole::Secondary,
            nad,
            PortInfo {
                address,
                mac: ip_to_mac(address.ip),
                tunnel_id,
            },
        );
        pod
    }

    fn gateway_config() -> SynthesisConfig {
        SynthesisConfig {
            gateway: Some(GatewayConfig::new(vec!["192.168.126.202/24".parse().unwrap()])),
            interconnect: false,
        }
    }

    #[test]
    fn test_layer3_without_gateway() {
        let net = network("isolatednet", Topology::Layer3, "10.128.0.0/14/23");
        let pods = vec![pod("myPod", "test-node", &net, "ns1/attachment1", "10.128.1.3/23", 1)];
        let objects = Synthesizer::new(SynthesisConfig::default()).synthesize(&[net], &pods).unwrap();

        let switch = objects.switch("isolatednet_test-node").unwrap();
        assert_eq!(
            switch.ports,
            vec![
                ObjectKey::for_name("stor-isolatednet_test-node"),
                ObjectKey::for_name("ns1.attachment1_ns1_myPod"),
            ]
        );
        assert!(switch.acls.is_empty());
        let other_config = switch.other_config.as_ref().unwrap();
        assert_eq!(other_config["subnet"], "10.128.0.0/14");
        assert_eq!(other_config["exclude_ips"], "10.128.0.2");
        assert_eq!(switch.external_ids[NETWORK_EXTERNAL_ID], "isolatednet");

        let stor = objects.switch_port("stor-isolatednet_test-node").unwrap();
        assert_eq!(stor.port_type, LogicalPortType::Router);
        assert_eq!(objects.routers().count(), 0);
    }

    #[test]
    fn test_layer3_with_gateway_per_node_objects() {
        let net = network("isolatednet", Topology::Layer3, "10.128.0.0/14/23");
        let pods = vec![
            pod("pod1", "test-node", &net, "ns1/attachment1", "10.128.1.3/23", 1),
            pod("pod2", "test-node", &net, "ns1/attachment1", "10.128.1.4/23", 1),
        ];
        let objects = Synthesizer::new(gateway_config()).synthesize(&[net], &pods).unwrap();

        let switch = objects.switch("isolatednet_test-node").unwrap();
        let routers = switch
            .ports
            .iter()
            .filter(|k| k.as_str().starts_with("stor-"))
            .count();
        let management = switch
            .ports
            .iter()
            .filter(|k| k.as_str().starts_with("k8s-"))
            .count();
        assert_eq!(routers, 1);
        assert_eq!(management, 1);
        assert_eq!(switch.ports.len(), 4);
        assert_eq!(switch.acls.len(), 1);
        assert_eq!(objects.acls().count(), 1);

        let acl = objects.acls().next().unwrap();
        assert_eq!(acl.match_expr, "ip4.src==10.128.0.2");

        let gr = match objects.by_name("GR_isolatednet_test-node").unwrap() {
            NbObject::LogicalRouter(router) => router,
            other => panic!("unexpected object {:?}", other),
        };
        assert_eq!(gr.external_ids["physical_ips"], "192.168.126.202,100.65.0.4");

        let join = objects.switch("isolatednet_join").unwrap();
        assert_eq!(join.ports, vec![ObjectKey::for_name("jtor-GR_isolatednet_test-node")]);

        match objects.by_name("isolatednet_ovn_cluster_router").unwrap() {
            NbObject::LogicalRouter(router) => assert_eq!(
                router.ports,
                vec![ObjectKey::for_name("rtos-isolatednet_test-node")]
            ),
            other => panic!("unexpected object {:?}", other),
        }
    }

    #[test]
    fn test_layer3_switch_per_node() {
        let net = network("isolatednet", Topology::Layer3, "10.128.0.0/14/23");
        let pods = vec![
            pod("pod1", "node1", &net, "ns1/attachment1", "10.128.1.3/23", 1),
            pod("pod2", "node2", &net, "ns1/attachment1", "10.128.2.3/23", 1),
        ];
        let objects = Synthesizer::new(gateway_config()).synthesize(&[net], &pods).unwrap();
        assert!(objects.switch("isolatednet_node1").is_some());
        assert!(objects.switch("isolatednet_node2").is_some());
        assert_eq!(objects.acls().count(), 2);
        assert_eq!(objects.switch("isolatednet_join").unwrap().ports.len(), 2);
    }

    #[test]
    fn test_layer3_interconnect_single_transit_switch() {
        let net = network("isolatednet", Topology::Layer3, "10.128.0.0/14/23");
        let config = SynthesisConfig {
            gateway: None,
            interconnect: true,
        };
        let synthesizer = Synthesizer::new(config);

        for pod_count in [0usize, 1, 3] {
            let pods: Vec<Pod> = (0..pod_count)
                .map(|i| {
                    pod(
                        &format!("pod{}", i),
                        &format!("node{}", i),
                        &net,
                        "ns1/attachment1",
                        &format!("10.128.{}.3/23", i * 2),
                        1,
                    )
                })
                .collect();
            let objects = synthesizer.synthesize(std::slice::from_ref(&net), &pods).unwrap();
            let transit: Vec<&LogicalSwitch> = objects
                .switches()
                .filter(|s| s.name.ends_with("_transit_switch"))
                .collect();
            assert_eq!(transit.len(), 1);
            assert_eq!(transit[0].name, "isolatednet_transit_switch");
            let config = transit[0].other_config.as_ref().unwrap();
            assert_eq!(config["requested-tnl-key"], "16711685");
            assert_eq!(config["mcast_snoop"], "true");
            assert_eq!(config["mcast_flood_unregistered"], "true");
            assert_eq!(config["interconn-ts"], "isolatednet_transit_switch");
        }
    }

    #[test]
    fn test_layer2_shared_switch() {
        let net = network("flatnet", Topology::Layer2, "100.200.0.0/16");
        let pods = vec![
            pod("pod1", "node1", &net, "ns1/attachment1", "100.200.0.3/16", 1),
            pod("pod2", "node2", &net, "ns1/attachment1", "100.200.0.4/16", 1),
        ];
        let objects = Synthesizer::new(gateway_config()).synthesize(&[net], &pods).unwrap();

        assert_eq!(objects.switches().count(), 1);
        let switch = objects.switch("flatnet_ovn_layer2_switch").unwrap();
        assert!(switch.other_config.is_none());
        assert_eq!(
            switch.ports,
            vec![
                ObjectKey::for_name("k8s-flatnet_node1"),
                ObjectKey::for_name("jtor-GR_flatnet_node1"),
                ObjectKey::for_name("ns1.attachment1_ns1_pod1"),
                ObjectKey::for_name("k8s-flatnet_node2"),
                ObjectKey::for_name("jtor-GR_flatnet_node2"),
                ObjectKey::for_name("ns1.attachment1_ns1_pod2"),
            ]
        );
        assert_eq!(switch.acls.len(), 2);
        assert!(objects.switch_ports().all(|p| !p.name.starts_with("stor-")));

        let join = objects.switch_port("jtor-GR_flatnet_node1").unwrap();
        assert_eq!(join.options["router-port"], "rtoj-GR_flatnet_node1");

        match objects.by_name("rtoj-GR_flatnet_node1").unwrap() {
            NbObject::LogicalRouterPort(port) => {
                assert_eq!(port.networks, vec!["100.200.0.1/16".to_string()])
            }
            other => panic!("unexpected object {:?}", other),
        }
    }

    #[test]
    fn test_layer2_without_gateway_has_only_endpoints() {
        let net = network("flatnet", Topology::Layer2, "100.200.0.0/16");
        let pods = vec![pod("pod1", "node1", &net, "ns1/attachment1", "100.200.0.3/16", 1)];
        let objects = Synthesizer::new(SynthesisConfig::default()).synthesize(&[net], &pods).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects.acls().count(), 0);
    }

    #[test]
    fn test_layer2_interconnect_sets_tunnel_key() {
        let net = network("flatnet", Topology::Layer2, "100.200.0.0/16");
        let pods = vec![pod("pod1", "node1", &net, "ns1/attachment1", "100.200.0.3/16", 2)];
        let config = SynthesisConfig {
            gateway: None,
            interconnect: true,
        };
        let objects = Synthesizer::new(config).synthesize(&[net], &pods).unwrap();
        let port = objects.switch_port("ns1.attachment1_ns1_pod1").unwrap();
        assert_eq!(port.options["requested-tnl-key"], "2");
        assert_eq!(objects.switches().count(), 1);
    }

    #[test]
    fn test_localnet_has_no_routing_objects() {
        let net = network("bridged", Topology::Localnet, "192.168.200.0/24");
        let pods = vec![
            pod("pod1", "node1", &net, "ns1/attachment1", "192.168.200.3/24", 1),
            pod("pod2", "node2", &net, "ns1/attachment1", "192.168.200.4/24", 1),
        ];
        let config = SynthesisConfig {
            interconnect: true,
            ..gateway_config()
        };
        let objects = Synthesizer::new(config).synthesize(&[net], &pods).unwrap();

        assert_eq!(objects.acls().count(), 0);
        assert_eq!(objects.routers().count(), 0);
        assert!(objects
            .switch_ports()
            .all(|p| p.port_type == LogicalPortType::Endpoint && !p.name.starts_with("k8s-")));
        let switch = objects.switch("bridged_ovn_localnet_switch").unwrap();
        assert_eq!(switch.ports.len(), 2);
        assert_eq!(
            switch.other_config.as_ref().unwrap()["subnet"],
            "192.168.200.0/24"
        );
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let l3 = network("isolatednet", Topology::Layer3, "10.128.0.0/14/23");
        let l2 = network("flatnet", Topology::Layer2, "100.200.0.0/16");
        let mut p = pod("pod1", "node1", &l3, "ns1/attachment1", "10.128.1.3/23", 1);
        let derived = derive_identifiers(Some(&"100.200.0.0/16".parse().unwrap()), &SequentialAddressing).unwrap();
        p.add_port(
            "flatnet",
            NetworkRole::Secondary,
            "ns1/attachment2",
            PortInfo {
                address: PodAddress {
                    ip: derived.address.ip(),
                    prefix_len: Some(derived.address.prefix()),
                },
                mac: derived.mac,
                tunnel_id: 2,
            },
        );
        let networks = vec![l3, l2];
        let pods = vec![p];
        let config = SynthesisConfig {
            interconnect: true,
            ..gateway_config()
        };
        let synthesizer = Synthesizer::new(config);

        let first = synthesizer.synthesize(&networks, &pods).unwrap();
        let second = synthesizer.synthesize(&networks, &pods).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_missing_subnet_skips_management_port() {
        let net = network("bridged", Topology::Layer2, "");
        let pods = vec![pod("pod1", "node1", &net, "ns1/attachment1", "192.168.200.3/24", 1)];
        let objects = Synthesizer::new(gateway_config()).synthesize(&[net], &pods).unwrap();
        assert_eq!(objects.acls().count(), 0);
        assert!(objects.switch_port("k8s-bridged_node1").is_none());
        assert!(objects.switch_port("jtor-GR_bridged_node1").is_some());
    }

    #[test]
    fn test_pods_without_the_network_are_ignored() {
        let net = network("isolatednet", Topology::Layer3, "10.128.0.0/14/23");
        let other = network("other", Topology::Layer3, "10.0.0.0/16/24");
        let pods = vec![pod("pod1", "node1", &other, "ns1/attachment1", "10.0.1.3/24", 1)];
        let objects = Synthesizer::new(gateway_config()).synthesize(&[net], &pods).unwrap();
        assert!(objects.is_empty());
    }

    fn port_info(ip: &str, tunnel_id: u32) -> PortInfo {
        let address: PodAddress = ip.parse().unwrap();
        PortInfo {
            address,
            mac: ip_to_mac(address.ip),
            tunnel_id,
        }
    }

    #[test]
    fn test_layer3_pod_with_two_interfaces() {
        let net = network("isolatednet", Topology::Layer3, "10.128.0.0/14/23");
        let mut p = pod("myPod", "test-node", &net, "ns1/attachment1", "10.128.1.3/23", 1);
        p.add_port(
            "isolatednet",
            NetworkRole::Secondary,
            "ns1/attachment2",
            port_info("10.128.1.4/23", 2),
        );
        let objects = Synthesizer::new(gateway_config()).synthesize(&[net], &[p]).unwrap();

        let switch = objects.switch("isolatednet_test-node").unwrap();
        assert_eq!(
            switch.ports,
            vec![
                ObjectKey::for_name("stor-isolatednet_test-node"),
                ObjectKey::for_name("k8s-isolatednet_test-node"),
                ObjectKey::for_name("ns1.attachment1_ns1_myPod"),
                ObjectKey::for_name("ns1.attachment2_ns1_myPod"),
            ]
        );
        assert_eq!(switch.acls.len(), 1);
        assert_eq!(objects.acls().count(), 1);
    }

    #[test]
    fn test_layer2_pod_with_two_interfaces() {
        let net = network("flatnet", Topology::Layer2, "100.200.0.0/16");
        let mut p = pod("pod1", "node1", &net, "ns1/attachment1", "100.200.0.3/16", 1);
        p.add_port(
            "flatnet",
            NetworkRole::Secondary,
            "ns1/attachment2",
            port_info("100.200.0.4/16", 2),
        );
        let objects = Synthesizer::new(gateway_config()).synthesize(&[net], &[p]).unwrap();

        let switch = objects.switch("flatnet_ovn_layer2_switch").unwrap();
        assert_eq!(
            switch.ports,
            vec![
                ObjectKey::for_name("k8s-flatnet_node1"),
                ObjectKey::for_name("jtor-GR_flatnet_node1"),
                ObjectKey::for_name("ns1.attachment1_ns1_pod1"),
                ObjectKey::for_name("ns1.attachment2_ns1_pod1"),
            ]
        );
        assert_eq!(switch.acls.len(), 1);
        assert_eq!(objects.routers().count(), 1);
    }

    #[test]
    fn test_node_named_like_transit_switch_is_a_conflict() {
        let net = network("isolatednet", Topology::Layer3, "10.128.0.0/14/23");
        let pods = vec![pod("p", "transit_switch", &net, "ns1/a", "10.128.1.3/23", 1)];
        let config = SynthesisConfig {
            gateway: None,
            interconnect: true,
        };
        let result = Synthesizer::new(config).synthesize(&[net], &pods);
        assert!(matches!(result, Err(CoreError::ObjectConflict(name)) if name.contains("isolatednet_transit_switch")));
    }

    #[test]
    fn test_node_named_like_join_switch_is_a_conflict() {
        let net = network("isolatednet", Topology::Layer3, "10.128.0.0/14/23");
        let pods = vec![pod("p", "join", &net, "ns1/a", "10.128.1.3/23", 1)];
        let result = Synthesizer::new(gateway_config()).synthesize(&[net], &pods);
        assert!(matches!(result, Err(CoreError::ObjectConflict(name)) if name.contains("isolatednet_join")));
    }

    #[test]
    fn test_cross_network_conflict() {
        // both networks scope their node switch to "a.b_node1"
        let first = network("a-b", Topology::Layer3, "10.128.0.0/14/23");
        let second = network("a/b", Topology::Layer3, "10.0.0.0/16/24");
        let pods = vec![
            pod("p1", "node1", &first, "ns1/a", "10.128.1.3/23", 1),
            pod("p2", "node1", &second, "ns1/b", "10.0.1.3/24", 1),
        ];
        let result = Synthesizer::new(SynthesisConfig::default()).synthesize(&[first, second], &pods);
        assert!(matches!(result, Err(CoreError::ObjectConflict(_))));
    }
}
