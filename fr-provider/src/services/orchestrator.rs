use super::launch::{build_launch_config, service_spec};
use super::supervisor::UpgradeSupervisor;
use crate::cluster::ClusterClient;
use crate::errors::{ProviderError, store, upstream};
use fr_metastore::{MetaStore, StoreError};
use fr_models::{
    ClusterService, FunctionDefinition, ScaleUpdate, ServiceState, ServiceUpgrade,
    is_valid_function_name,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

/// Deploy, update, delete and scale functions on the cluster while keeping
/// the metadata store in step.
pub struct Orchestrator {
    cluster: Arc<dyn ClusterClient>,
    store: Arc<dyn MetaStore>,
    supervisor: Arc<UpgradeSupervisor>,
}

impl Orchestrator {
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        store: Arc<dyn MetaStore>,
        supervisor: Arc<UpgradeSupervisor>,
    ) -> Self {
        Self {
            cluster,
            store,
            supervisor,
        }
    }

    pub fn supervisor(&self) -> &Arc<UpgradeSupervisor> {
        &self.supervisor
    }

    pub async fn deploy(&self, definition: &FunctionDefinition) -> Result<(), ProviderError> {
        check_definition(definition)?;

        let launch_config = build_launch_config(self.cluster.as_ref(), definition).await?;
        let spec = service_spec(definition, launch_config);
        self.cluster
            .create_service(&spec)
            .await
            .map_err(upstream("CreateService"))?;

        self.store.put(definition).await.map_err(store("put"))?;
        info!(function = %definition.name, image = %definition.image, "function deployed");
        Ok(())
    }

    /// Start a rolling upgrade and return once the cluster accepted it.
    /// Completion is confirmed by a supervisor task.
    pub async fn update(&self, definition: &FunctionDefinition) -> Result<(), ProviderError> {
        check_definition(definition)?;
        let name = definition.name.as_str();

        // held until the supervisor terminates, or dropped on early return
        let slot = self.supervisor.try_claim(name)?;

        let service = self.find_service(name).await?;
        if service.state != ServiceState::Active {
            return Err(ProviderError::InvalidState {
                name: name.to_string(),
                state: service.state,
            });
        }

        let launch_config = build_launch_config(self.cluster.as_ref(), definition).await?;
        self.cluster
            .upgrade_service(&service, &ServiceUpgrade::rolling(launch_config))
            .await
            .map_err(upstream("UpgradeService"))?;

        let persisted = self.store.put(definition).await.map_err(store("put"));
        if let Err(e) = &persisted {
            error!(function = %name, error = %e, "upgrade started but definition was not stored");
        }

        self.supervisor.launch(slot);
        info!(function = %name, "function upgrade started");
        persisted
    }

    pub async fn delete(&self, name: &str) -> Result<(), ProviderError> {
        let service = self.find_managed_service(name).await?;
        self.cluster
            .delete_service(&service)
            .await
            .map_err(upstream("DeleteService"))?;

        match self.store.delete(name).await {
            Ok(()) | Err(StoreError::NotFound(_)) => {}
            Err(e) => {
                warn!(function = %name, op = "delete", error = %e, "function removed but metadata delete failed");
            }
        }
        info!(function = %name, "function deleted");
        Ok(())
    }

    pub async fn scale(&self, name: &str, replicas: u64) -> Result<(), ProviderError> {
        let service = self.find_managed_service(name).await?;
        self.cluster
            .update_service(&service, &ScaleUpdate { scale: replicas })
            .await
            .map_err(upstream("UpdateService"))?;
        info!(function = %name, replicas, "function scaled");
        Ok(())
    }

    async fn find_service(&self, name: &str) -> Result<ClusterService, ProviderError> {
        self.cluster
            .find_service_by_name(name)
            .await
            .map_err(upstream("FindServiceByName"))?
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))
    }

    /// Like [`Self::find_service`], refusing services without the marker label.
    async fn find_managed_service(&self, name: &str) -> Result<ClusterService, ProviderError> {
        let service = self.find_service(name).await?;
        if !service.is_function() {
            warn!(function = %name, "refusing to touch unmanaged service");
            return Err(ProviderError::NotManaged(name.to_string()));
        }
        Ok(service)
    }
}

fn check_definition(definition: &FunctionDefinition) -> Result<(), ProviderError> {
    if !is_valid_function_name(&definition.name) {
        return Err(ProviderError::InvalidName(definition.name.clone()));
    }
    definition
        .validate()
        .map_err(|e| ProviderError::InvalidInput(e.to_string()))
}
