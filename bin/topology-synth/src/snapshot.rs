//! Cluster snapshot read by the CLI

use anyhow::{anyhow, Context, Result};
use ipnetwork::IpNetwork;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use topology_api::{NetConf, PodRoute};
use topology_core::addressing::{assign_tunnel_ids, derive_identifiers, NodeAddressing};
use topology_core::{AttachmentDeclaration, GatewayConfig, Network, Pod, PodAddress, PortInfo};
use tracing::{debug, warn};

/// Networks, pods and cluster settings of one synthesis run
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub interconnect: bool,
    #[serde(default)]
    pub gateway: Option<GatewayConfig>,
    /// CNI configuration of every network attachment definition
    pub networks: Vec<NetConf>,
    #[serde(default)]
    pub pods: Vec<PodSpec>,
}

/// A pod and the attachments it requests, in declaration order
#[derive(Debug, Deserialize)]
pub struct PodSpec {
    pub namespace: String,
    pub name: String,
    pub node: String,
    #[serde(default)]
    pub pod_ip: String,
    /// `namespace/name` of each attachment definition
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Subnet allocated to the pod's node, by network name
    #[serde(default)]
    pub node_subnets: BTreeMap<String, String>,
    /// Extra pod routes, by attachment as written in `attachments`
    #[serde(default)]
    pub routes: BTreeMap<String, Vec<PodRoute>>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let snapshot = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing snapshot {}", path.display()))?;
        Ok(snapshot)
    }

    pub fn networks(&self) -> Result<Vec<Network>> {
        self.networks
            .iter()
            .map(|conf| {
                Network::try_from(conf).with_context(|| format!("network {}", conf.name))
            })
            .collect()
    }

    /// Attachment declarations of `pod`, resolved against the snapshot networks
    pub fn declarations(&self, pod: &PodSpec) -> Result<Vec<AttachmentDeclaration>> {
        pod.attachments
            .iter()
            .map(|attachment| {
                let qualified = if attachment.contains('/') {
                    attachment.clone()
                } else {
                    format!("{}/{}", pod.namespace, attachment)
                };
                let conf = self
                    .networks
                    .iter()
                    .find(|conf| conf.net_attach_def_name == qualified)
                    .ok_or_else(|| {
                        anyhow!("pod {}/{} requests unknown attachment {}", pod.namespace, pod.name, qualified)
                    })?;
                let mut declaration = AttachmentDeclaration::try_from(conf)?;
                if let Some(routes) = pod.routes.get(attachment) {
                    declaration.routes = routes.clone();
                }
                Ok(declaration)
            })
            .collect()
    }
}

/// The model pod for `spec`, each interface addressed from the node subnet
/// or the network's first subnet
pub fn model_pod(
    spec: &PodSpec,
    declarations: &[AttachmentDeclaration],
    networks: &[Network],
    addressing: &dyn NodeAddressing,
) -> Result<Pod> {
    let mut pod = Pod::new(&spec.namespace, &spec.name, &spec.node);
    let tunnel_ids = assign_tunnel_ids(declarations.iter().map(|d| &d.nad_name));

    for (declaration, (nad_name, tunnel_id)) in declarations.iter().zip(tunnel_ids) {
        let node_subnet = spec
            .node_subnets
            .get(&declaration.network_name)
            .map(|s| {
                s.parse::<IpNetwork>()
                    .and_then(|net| IpNetwork::new(net.network(), net.prefix()))
            })
            .transpose()
            .with_context(|| format!("node subnet of network {}", declaration.network_name))?;
        let subnet = node_subnet.or_else(|| {
            networks
                .iter()
                .find(|n| n.name == declaration.network_name)
                .and_then(|n| n.first_subnet())
                .map(|s| s.cidr)
        });

        let Some(derived) = derive_identifiers(subnet.as_ref(), addressing) else {
            warn!(
                "No address for {}/{} on {}, leaving the attachment out",
                spec.namespace, spec.name, nad_name
            );
            continue;
        };
        debug!("Addressing {}/{} on {} with {}", spec.namespace, spec.name, nad_name, derived.address);

        let info = pod.add_port(
            &declaration.network_name,
            declaration.role(),
            &nad_name,
            PortInfo {
                address: PodAddress {
                    ip: derived.address.ip(),
                    prefix_len: Some(derived.address.prefix()),
                },
                mac: derived.mac,
                tunnel_id,
            },
        );
        info.node_subnet = node_subnet;
    }

    Ok(pod)
}
