use crate::cluster::ClusterClient;
use crate::errors::{ProviderError, upstream};
use fr_models::{ClusterSecret, SecretSpec, SecretView};
use std::sync::Arc;
use tracing::info;

/// Mirrors gateway secrets into the cluster. Every call re-reads the
/// cluster's secret list; nothing is cached.
pub struct SecretSynchronizer {
    cluster: Arc<dyn ClusterClient>,
}

impl SecretSynchronizer {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self { cluster }
    }

    pub async fn upsert(&self, name: &str, value: &str) -> Result<(), ProviderError> {
        if name.is_empty() {
            return Err(ProviderError::InvalidInput("secret name cannot be empty".into()));
        }
        match self.lookup(name).await? {
            Some(existing) => {
                self.cluster
                    .update_secret(&existing, value)
                    .await
                    .map_err(upstream("UpdateSecret"))?;
                info!(secret = %name, "secret updated");
            }
            None => {
                self.cluster
                    .create_secret(&SecretSpec {
                        name: name.to_string(),
                        value: value.to_string(),
                    })
                    .await
                    .map_err(upstream("CreateSecret"))?;
                info!(secret = %name, "secret created");
            }
        }
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Result<(), ProviderError> {
        if name.is_empty() {
            return Err(ProviderError::InvalidInput("secret name cannot be empty".into()));
        }
        let existing = self
            .lookup(name)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("secret {}", name)))?;
        self.cluster
            .delete_secret(&existing)
            .await
            .map_err(upstream("DeleteSecret"))?;
        info!(secret = %name, "secret deleted");
        Ok(())
    }

    /// Secret names, sorted. Values are never returned.
    pub async fn list(&self) -> Result<Vec<SecretView>, ProviderError> {
        let mut views: Vec<SecretView> = self
            .cluster
            .list_secrets()
            .await
            .map_err(upstream("ListSecrets"))?
            .into_iter()
            .map(|s| SecretView { name: s.name })
            .collect();
        views.sort();
        views.dedup();
        Ok(views)
    }

    async fn lookup(&self, name: &str) -> Result<Option<ClusterSecret>, ProviderError> {
        let secrets = self
            .cluster
            .list_secrets()
            .await
            .map_err(upstream("ListSecrets"))?;
        Ok(secrets.into_iter().find(|s| s.name == name))
    }
}
