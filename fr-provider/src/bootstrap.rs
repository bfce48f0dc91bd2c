//! Composition root: every shared component is built once here and handed
//! to its users explicitly.

use anyhow::{Context, Result};
use fr_metastore::{MetaStore, RedbMetaStore};
use std::sync::Arc;
use tracing::info;

use crate::{
    api::FunctionProxy,
    cluster::{ClusterClient, MemoryCluster, RancherClient},
    config::{AppConfig, ClusterBackend},
    server::{ApiServer, AppState},
    services::{Orchestrator, Reconciler, SecretSynchronizer, UpgradeSupervisor},
};

pub async fn build_cluster(config: &AppConfig) -> Result<Arc<dyn ClusterClient>> {
    match config.backend() {
        ClusterBackend::Rancher => {
            let client = RancherClient::connect(config.rancher()?)
                .await
                .context("NewClientForConfig")?;
            Ok(Arc::new(client))
        }
        ClusterBackend::Memory => {
            info!("using in-memory cluster backend");
            Ok(Arc::new(MemoryCluster::new()))
        }
    }
}

pub fn open_store(config: &AppConfig) -> Result<Arc<RedbMetaStore>> {
    let store = RedbMetaStore::open(&config.metastore_path)
        .with_context(|| format!("Open [metastore] at {}", config.metastore_path))?;
    Ok(Arc::new(store))
}

/// Wire services and API state on top of an existing cluster client and
/// store.
pub fn build_state(
    config: &AppConfig,
    cluster: Arc<dyn ClusterClient>,
    store: Arc<dyn MetaStore>,
) -> Result<AppState> {
    let supervisor = Arc::new(UpgradeSupervisor::new(cluster.clone(), config.supervisor()));
    let reconciler = Arc::new(Reconciler::new(cluster.clone(), store.clone()));
    let orchestrator = Arc::new(Orchestrator::new(cluster.clone(), store, supervisor));
    let secrets = Arc::new(SecretSynchronizer::new(cluster));
    let proxy = Arc::new(FunctionProxy::new(config.proxy()).context("proxy client")?);

    Ok(AppState {
        reconciler,
        orchestrator,
        secrets,
        proxy,
        orchestration: match config.backend() {
            ClusterBackend::Rancher => "rancher",
            ClusterBackend::Memory => "memory",
        },
    })
}

/// A wired server together with the store it has to close on shutdown.
pub struct Provider {
    pub server: ApiServer,
    pub store: Arc<RedbMetaStore>,
}

pub async fn build_provider(config: &AppConfig) -> Result<Provider> {
    let cluster = build_cluster(config).await?;
    let store = open_store(config)?;
    let state = build_state(config, cluster, store.clone())?;
    Ok(Provider {
        server: ApiServer::new(state, config.server()),
        store,
    })
}

/// Build a fully-wired provider from environment variables.
pub async fn build_provider_from_env() -> Result<Provider> {
    let config = AppConfig::load_from_env()?;
    build_provider(&config).await
}
