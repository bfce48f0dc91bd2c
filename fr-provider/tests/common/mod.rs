#![allow(dead_code)]

use fr_metastore::{MemoryMetaStore, MetaStore};
use fr_models::{
    ClusterService, FUNCTION_MARKER_LABEL, FunctionDefinition, LaunchConfig,
    ServiceState,
};
use fr_provider::{
    MemoryCluster, Orchestrator, Reconciler, SecretSynchronizer,
    services::{SupervisorSettings, UpgradeSupervisor},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct Fixture {
    pub cluster: Arc<MemoryCluster>,
    pub store: Arc<MemoryMetaStore>,
    pub supervisor: Arc<UpgradeSupervisor>,
    pub reconciler: Reconciler,
    pub orchestrator: Orchestrator,
    pub secrets: SecretSynchronizer,
}

pub fn settings(max_attempts: u32) -> SupervisorSettings {
    SupervisorSettings {
        poll_interval: Duration::from_secs(1),
        max_attempts,
    }
}

pub fn fixture() -> Fixture {
    fixture_with(MemoryCluster::new(), settings(30))
}

pub fn fixture_with(cluster: MemoryCluster, settings: SupervisorSettings) -> Fixture {
    let cluster = Arc::new(cluster);
    let store = Arc::new(MemoryMetaStore::new());
    fixture_with_store(cluster, store, settings)
}

pub fn fixture_with_store(
    cluster: Arc<MemoryCluster>,
    store: Arc<MemoryMetaStore>,
    settings: SupervisorSettings,
) -> Fixture {
    let supervisor = Arc::new(UpgradeSupervisor::new(cluster.clone(), settings));
    let dyn_store: Arc<dyn MetaStore> = store.clone();
    Fixture {
        reconciler: Reconciler::new(cluster.clone(), dyn_store.clone()),
        orchestrator: Orchestrator::new(cluster.clone(), dyn_store, supervisor.clone()),
        secrets: SecretSynchronizer::new(cluster.clone()),
        cluster,
        store,
        supervisor,
    }
}

pub fn definition(name: &str, image: &str) -> FunctionDefinition {
    FunctionDefinition::new(name, image)
}

/// A running service as it would appear after an out-of-band deployment.
pub fn running_service(name: &str, image: &str, marked: bool) -> ClusterService {
    let mut labels = HashMap::new();
    if marked {
        labels.insert(FUNCTION_MARKER_LABEL.to_string(), name.to_string());
    }
    ClusterService {
        id: String::new(),
        name: name.to_string(),
        state: ServiceState::Active,
        scale: 1,
        launch_config: LaunchConfig {
            image_uuid: format!("docker:{}", image),
            environment: HashMap::new(),
            labels,
            secrets: vec![],
        },
    }
}
