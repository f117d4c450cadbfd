//! Pod network annotations for attachments nobody allocated for
//!
//! Flat layer2 secondary attachments are normally addressed by an allocator
//! running elsewhere. Without one, their `k8s.ovn.org/pod-networks` entries
//! are derived here from the attachment subnets.

use crate::addressing::{assign_tunnel_ids, derive_from_str, format_mac, NodeAddressing};
use crate::model::{NetworkRole, Topology};
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use topology_api::{NetConf, NetworkSelectionElement, PodAnnotation, PodRoute};
use tracing::{debug, warn};

/// A pod's request to join a network through an attachment definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDeclaration {
    /// `namespace/name` of the attachment definition
    pub nad_name: String,
    pub network_name: String,
    pub topology: Topology,
    /// Comma separated CIDRs
    #[serde(default)]
    pub subnets: String,
    #[serde(default)]
    pub is_primary: bool,
    /// Extra routes handed to the pod on this attachment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<PodRoute>,
}

impl AttachmentDeclaration {
    pub fn role(&self) -> NetworkRole {
        if self.is_primary {
            NetworkRole::Primary
        } else {
            NetworkRole::Secondary
        }
    }
}

impl TryFrom<&NetConf> for AttachmentDeclaration {
    type Error = CoreError;

    fn try_from(conf: &NetConf) -> Result<Self> {
        Ok(Self {
            nad_name: conf.net_attach_def_name.clone(),
            network_name: conf.name.clone(),
            topology: conf.topology.parse()?,
            subnets: conf.subnets.clone().unwrap_or_default(),
            is_primary: conf.primary_network,
            routes: Vec::new(),
        })
    }
}

/// Annotation entry for one layer2 attachment: a workload address and the
/// node gateway of every subnet, the MAC following the first address.
/// `None` when any subnet cannot be addressed.
pub fn pod_annotation(
    declaration: &AttachmentDeclaration,
    tunnel_id: u32,
    addressing: &dyn NodeAddressing,
) -> Option<PodAnnotation> {
    let mut ips = Vec::new();
    let mut gateways = Vec::new();
    let mut mac = None;

    for subnet in declaration.subnets.split(',') {
        let derived = derive_from_str(subnet, addressing)?;
        let gateway = addressing.gateway_address(&derived.address)?;
        mac.get_or_insert(derived.mac);
        ips.push(derived.address.to_string());
        gateways.push(gateway.ip().to_string());
    }

    Some(PodAnnotation {
        ips,
        mac: format_mac(&mac?),
        gateways,
        routes: declaration.routes.clone(),
        tunnel_id,
        role: declaration.role().as_str().to_string(),
        ..Default::default()
    })
}

/// Encode the `k8s.ovn.org/pod-networks` annotation for `declarations`
///
/// Only secondary layer2 attachments are encoded. Tunnel ids are the
/// 1-based position of each attachment among all declarations.
pub fn encode_pod_networks(
    declarations: &[AttachmentDeclaration],
    addressing: &dyn NodeAddressing,
) -> Result<String> {
    let tunnel_ids = assign_tunnel_ids(declarations.iter().map(|d| &d.nad_name));

    let mut annotations = BTreeMap::new();
    for (declaration, (nad_name, tunnel_id)) in declarations.iter().zip(tunnel_ids) {
        if declaration.is_primary || declaration.topology != Topology::Layer2 {
            continue;
        }
        match pod_annotation(declaration, tunnel_id, addressing) {
            Some(annotation) => {
                debug!("Encoding pod network annotation for {}", nad_name);
                annotations.insert(nad_name, annotation);
            }
            None => warn!(
                "Cannot derive addresses for {} from subnets {:?}, leaving it out",
                nad_name, declaration.subnets
            ),
        }
    }

    Ok(serde_json::to_string(&annotations)?)
}

/// Elements of the `k8s.v1.cni.cncf.io/networks` annotation. Primary
/// attachments are plugged in implicitly and left out.
pub fn network_selection_elements(
    namespace: &str,
    declarations: &[AttachmentDeclaration],
) -> Vec<NetworkSelectionElement> {
    declarations
        .iter()
        .filter(|d| !d.is_primary)
        .map(|d| NetworkSelectionElement::from_attachment(&d.nad_name, namespace))
        .collect()
}
