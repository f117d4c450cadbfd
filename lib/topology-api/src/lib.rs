//! Wire and data types for the multi-homed topology synthesizer
//!
//! This library defines the shapes exchanged with collaborators:
//! - nbdb: logical switches, ports, routers and ACLs destined for the
//!   northbound database
//! - pod_networks: the `k8s.ovn.org/pod-networks` annotation payload
//! - netconf: the CNI configuration carried by a network attachment definition
//! - selection: network selection elements of the `k8s.v1.cni.cncf.io/networks` annotation

pub mod nbdb;
pub mod netconf;
pub mod pod_networks;
pub mod selection;

pub use nbdb::{Acl, LogicalRouter, LogicalRouterPort, LogicalSwitch, LogicalSwitchPort, NbObject, ObjectKey};
pub use netconf::NetConf;
pub use pod_networks::{PodAnnotation, PodRoute};
pub use selection::NetworkSelectionElement;

/// Annotation listing the secondary networks a pod attaches to
pub const NETWORK_ATTACHMENT_ANNOTATION: &str = "k8s.v1.cni.cncf.io/networks";
/// Annotation carrying per-network addressing allocated for a pod
pub const POD_NETWORKS_ANNOTATION: &str = "k8s.ovn.org/pod-networks";
