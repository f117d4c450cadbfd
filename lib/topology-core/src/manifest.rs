//! Pod manifests carrying multi-homing annotations

use crate::addressing::NodeAddressing;
use crate::annotation::{encode_pod_networks, network_selection_elements, AttachmentDeclaration};
use crate::Result;
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use topology_api::{NETWORK_ATTACHMENT_ANNOTATION, POD_NETWORKS_ANNOTATION};

const EMPTY_POD_NETWORKS: &str = "{}";

/// A running pod on `node` attached to every network in `declarations`
///
/// In interconnect mode the pod also carries the `k8s.ovn.org/pod-networks`
/// addressing of its layer2 attachments, unless there is none.
pub fn multi_homed_pod(
    namespace: &str,
    name: &str,
    node: &str,
    pod_ip: &str,
    declarations: &[AttachmentDeclaration],
    interconnect: bool,
    addressing: &dyn NodeAddressing,
) -> Result<Pod> {
    let elements = network_selection_elements(namespace, declarations);

    let mut annotations = BTreeMap::new();
    annotations.insert(
        NETWORK_ATTACHMENT_ANNOTATION.to_string(),
        serde_json::to_string(&elements)?,
    );
    if interconnect {
        let pod_networks = encode_pod_networks(declarations, addressing)?;
        if pod_networks != EMPTY_POD_NETWORKS {
            annotations.insert(POD_NETWORKS_ANNOTATION.to_string(), pod_networks);
        }
    }

    Ok(Pod {
        metadata: ObjectMeta {
            name: Some(name.into()),
            namespace: Some(namespace.into()),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: Some(node.into()),
            containers: vec![Container {
                name: "containerName".into(),
                image: Some("containerImage".into()),
                ..Default::default()
            }],
            ..Default::default()
        }),
        status: Some(PodStatus {
            phase: Some("Running".into()),
            pod_ip: (!pod_ip.is_empty()).then(|| pod_ip.into()),
            ..Default::default()
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::SequentialAddressing;
    use crate::model::Topology;

    fn declarations() -> Vec<AttachmentDeclaration> {
        vec![
            AttachmentDeclaration {
                nad_name: "ns1/routed".to_string(),
                network_name: "routed".to_string(),
                topology: Topology::Layer3,
                subnets: "10.128.0.0/14".to_string(),
                is_primary: false,
                routes: Vec::new(),
            },
            AttachmentDeclaration {
                nad_name: "ns1/flat".to_string(),
                network_name: "flat".to_string(),
                topology: Topology::Layer2,
                subnets: "100.200.0.0/16".to_string(),
                is_primary: false,
                routes: Vec::new(),
            },
        ]
    }

    fn annotations(pod: &Pod) -> &BTreeMap<String, String> {
        pod.metadata.annotations.as_ref().unwrap()
    }

    #[test]
    fn test_pod_metadata_and_status() {
        let pod = multi_homed_pod("ns1", "myPod", "node1", "10.0.0.3", &[], false, &SequentialAddressing)
            .unwrap();
        assert_eq!(pod.metadata.name.as_deref(), Some("myPod"));
        assert_eq!(pod.metadata.namespace.as_deref(), Some("ns1"));
        assert_eq!(pod.spec.as_ref().unwrap().node_name.as_deref(), Some("node1"));
        let status = pod.status.as_ref().unwrap();
        assert_eq!(status.phase.as_deref(), Some("Running"));
        assert_eq!(status.pod_ip.as_deref(), Some("10.0.0.3"));
    }

    #[test]
    fn test_networks_annotation() {
        let pod = multi_homed_pod("ns1", "myPod", "node1", "", &declarations(), false, &SequentialAddressing)
            .unwrap();
        let networks: serde_json::Value =
            serde_json::from_str(&annotations(&pod)[NETWORK_ATTACHMENT_ANNOTATION]).unwrap();
        assert_eq!(networks[0]["name"], "routed");
        assert_eq!(networks[0]["namespace"], "ns1");
        assert_eq!(networks[1]["name"], "flat");
        assert!(!annotations(&pod).contains_key(POD_NETWORKS_ANNOTATION));
        assert!(pod.status.unwrap().pod_ip.is_none());
    }

    #[test]
    fn test_interconnect_adds_pod_networks() {
        let pod = multi_homed_pod("ns1", "myPod", "node1", "", &declarations(), true, &SequentialAddressing)
            .unwrap();
        let pod_networks: serde_json::Value =
            serde_json::from_str(&annotations(&pod)[POD_NETWORKS_ANNOTATION]).unwrap();
        assert_eq!(pod_networks["ns1/flat"]["tunnel_id"], 2);
        assert!(pod_networks.get("ns1/routed").is_none());
    }

    #[test]
    fn test_empty_pod_networks_are_omitted() {
        let routed_only = &declarations()[..1];
        let pod = multi_homed_pod("ns1", "myPod", "node1", "", routed_only, true, &SequentialAddressing)
            .unwrap();
        assert!(!annotations(&pod).contains_key(POD_NETWORKS_ANNOTATION));
    }
}
