//! Core topology synthesis
//!
//! This library provides:
//! - Input model for networks, pods and gateway configuration
//! - Deterministic derivation of addresses, MACs and tunnel ids
//! - Builders for switch ports, gateway routers and ACLs
//! - The synthesizer turning networks and pods into northbound objects
//! - Pod network annotations and manifests for multi-homed pods
//! - A registry of the desired topology per network

pub mod addressing;
pub mod annotation;
pub mod error;
pub mod gateway;
pub mod manifest;
pub mod model;
pub mod naming;
pub mod object_set;
pub mod ports;
pub mod registry;
pub mod synth;

pub use addressing::{NodeAddressing, SequentialAddressing};
pub use annotation::{encode_pod_networks, AttachmentDeclaration};
pub use error::{CoreError, Result};
pub use manifest::multi_homed_pod;
pub use model::{GatewayConfig, Network, NetworkRole, Pod, PodAddress, PortInfo, Subnet, Topology};
pub use object_set::{ObjectDelta, ObjectSet};
pub use registry::TopologyRegistry;
pub use synth::{SynthesisConfig, Synthesizer};
