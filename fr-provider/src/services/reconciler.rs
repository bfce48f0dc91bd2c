use crate::cluster::ClusterClient;
use crate::errors::{ProviderError, store, upstream};
use fr_metastore::{MetaStore, StoreError};
use fr_models::{ClusterService, FunctionDefinition, FunctionView, ServiceState};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Merges the services running on the cluster with the stored function
/// definitions, restoring definitions that are missing from the store.
pub struct Reconciler {
    cluster: Arc<dyn ClusterClient>,
    store: Arc<dyn MetaStore>,
}

impl Reconciler {
    pub fn new(cluster: Arc<dyn ClusterClient>, store: Arc<dyn MetaStore>) -> Self {
        Self { cluster, store }
    }

    /// Managed, active functions. Order is not significant.
    pub async fn list_functions(&self) -> Result<Vec<FunctionView>, ProviderError> {
        let services = self
            .cluster
            .list_services()
            .await
            .map_err(upstream("ListServices"))?;

        let mut seen = HashSet::new();
        let mut functions = Vec::new();
        for service in services {
            if service.state != ServiceState::Active || !service.is_function() {
                continue;
            }
            if !seen.insert(service.name.clone()) {
                warn!(function = %service.name, id = %service.id, "duplicate service name ignored");
                continue;
            }

            let definition = match self.store.get(&service.name).await {
                Ok(definition) => definition,
                Err(StoreError::NotFound(_)) => self.restore(&service).await?,
                Err(e) => return Err(store("get")(e)),
            };
            functions.push(FunctionView::from_definition(definition, service.scale));
        }
        debug!(count = functions.len(), "functions listed");
        Ok(functions)
    }

    pub async fn find_function(&self, name: &str) -> Result<FunctionView, ProviderError> {
        self.list_functions()
            .await?
            .into_iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))
    }

    async fn restore(
        &self,
        service: &ClusterService,
    ) -> Result<FunctionDefinition, ProviderError> {
        let definition = definition_from_service(service);
        match self.store.put(&definition).await {
            Ok(()) => {
                info!(function = %definition.name, "function metadata restored from cluster");
            }
            Err(e) if e.is_transient() || matches!(e, StoreError::InvalidDefinition(_)) => {
                warn!(function = %definition.name, error = %e, "could not restore function metadata");
            }
            Err(e) => {
                return Err(ProviderError::ReconcileWriteFailed {
                    name: definition.name,
                    source: e,
                });
            }
        }
        Ok(definition)
    }
}

/// Definition as far as it can be recovered from a running service.
pub fn definition_from_service(service: &ClusterService) -> FunctionDefinition {
    let lc = &service.launch_config;
    FunctionDefinition {
        name: service.name.clone(),
        image: lc.image().to_string(),
        env_process: lc.env_process().map(str::to_string),
        labels: lc.labels.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fr_models::{FUNCTION_MARKER_LABEL, LaunchConfig};
    use std::collections::HashMap;

    #[test]
    fn recovered_definition_strips_runtime_prefix() {
        let service = ClusterService {
            id: "1s1".into(),
            name: "echo".into(),
            state: ServiceState::Active,
            scale: 2,
            launch_config: LaunchConfig {
                image_uuid: "docker:alpine:latest".into(),
                environment: HashMap::from([
                    ("fprocess".to_string(), "cat".to_string()),
                    ("OTHER".to_string(), "x".to_string()),
                ]),
                labels: HashMap::from([(
                    FUNCTION_MARKER_LABEL.to_string(),
                    "echo".to_string(),
                )]),
                secrets: vec![],
            },
        };

        let def = definition_from_service(&service);
        assert_eq!(def.name, "echo");
        assert_eq!(def.image, "alpine:latest");
        assert_eq!(def.env_process.as_deref(), Some("cat"));
        assert!(def.env_vars.is_empty());
        assert!(def.labels.contains_key(FUNCTION_MARKER_LABEL));
    }
}
