mod snapshot;

use anyhow::{anyhow, Context, Result};
use k8s_openapi::api::core::v1::Pod as PodManifest;
use serde::Serialize;
use snapshot::{model_pod, Snapshot};
use std::path::PathBuf;
use topology_core::{
    multi_homed_pod, Network, ObjectSet, Pod, SequentialAddressing, SynthesisConfig, Synthesizer,
    TopologyRegistry,
};
use tracing::{debug, info};
use tracing_subscriber::fmt::init as tracing_init;

/// What a run prints: the desired objects and the pods carrying them
#[derive(Serialize)]
struct Output {
    objects: ObjectSet,
    pods: Vec<PodManifest>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TOPOLOGY_SNAPSHOT").ok())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: topology-synth <snapshot.yaml> (or set TOPOLOGY_SNAPSHOT)"))?;

    info!("Loading snapshot from {}", path.display());
    let snapshot = Snapshot::load(&path)?;

    let interconnect = match std::env::var("TOPOLOGY_INTERCONNECT") {
        Ok(value) => value
            .parse::<bool>()
            .with_context(|| format!("TOPOLOGY_INTERCONNECT={}", value))?,
        Err(_) => snapshot.interconnect,
    };
    let config = SynthesisConfig {
        gateway: snapshot.gateway.clone(),
        interconnect,
    };

    let networks = snapshot.networks()?;
    let (pods, manifests) = load_pods(&snapshot, &networks, interconnect)?;
    debug!("Snapshot has {} networks and {} pods", networks.len(), pods.len());

    let registry = TopologyRegistry::new();
    let objects = synthesize(&Synthesizer::new(config), &registry, &networks, &pods).await?;
    info!(
        "Synthesized {} objects across {} networks",
        objects.len(),
        registry.network_count().await
    );

    let output = Output {
        objects,
        pods: manifests,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_pods(
    snapshot: &Snapshot,
    networks: &[Network],
    interconnect: bool,
) -> Result<(Vec<Pod>, Vec<PodManifest>)> {
    let mut pods = Vec::new();
    let mut manifests = Vec::new();

    for spec in &snapshot.pods {
        let declarations = snapshot.declarations(spec)?;
        pods.push(model_pod(spec, &declarations, networks, &SequentialAddressing)?);
        manifests.push(multi_homed_pod(
            &spec.namespace,
            &spec.name,
            &spec.node,
            &spec.pod_ip,
            &declarations,
            interconnect,
            &SequentialAddressing,
        )?);
    }

    Ok((pods, manifests))
}

async fn synthesize(
    synthesizer: &Synthesizer,
    registry: &TopologyRegistry,
    networks: &[Network],
    pods: &[Pod],
) -> Result<ObjectSet> {
    let mut all = ObjectSet::new();

    for network in networks {
        let objects = synthesizer.synthesize_network(network, pods)?;
        let delta = registry.register(&network.name, objects.clone()).await?;
        info!(
            "Network {}: {} objects to add, {} to update, {} to remove",
            network.name,
            delta.added.len(),
            delta.changed.len(),
            delta.removed.len()
        );
        all.extend(objects)?;
    }

    Ok(all)
}
