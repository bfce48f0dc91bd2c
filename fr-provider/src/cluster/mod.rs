pub mod memory;
pub mod rancher;

pub use memory::MemoryCluster;
pub use rancher::{RancherClient, RancherConfig};

use crate::errors::ClusterError;
use async_trait::async_trait;
use fr_models::{
    ClusterSecret, ClusterService, ScaleUpdate, SecretSpec, ServiceSpec,
    ServiceUpgrade,
};

pub type ClusterResult<T> = Result<T, ClusterError>;

/// Operations the provider needs from the container orchestrator.
///
/// Implementations must be safe for concurrent use; the supervisor polls
/// through the same client that request handlers use.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Services of the functions stack, managed or not.
    async fn list_services(&self) -> ClusterResult<Vec<ClusterService>>;

    async fn find_service_by_name(
        &self,
        name: &str,
    ) -> ClusterResult<Option<ClusterService>>;

    async fn create_service(
        &self,
        spec: &ServiceSpec,
    ) -> ClusterResult<ClusterService>;

    async fn delete_service(&self, service: &ClusterService) -> ClusterResult<()>;

    async fn update_service(
        &self,
        service: &ClusterService,
        update: &ScaleUpdate,
    ) -> ClusterResult<ClusterService>;

    /// Starts a rolling upgrade. Returns once the orchestrator accepted it.
    async fn upgrade_service(
        &self,
        service: &ClusterService,
        upgrade: &ServiceUpgrade,
    ) -> ClusterResult<ClusterService>;

    async fn finish_upgrade(
        &self,
        service: &ClusterService,
    ) -> ClusterResult<ClusterService>;

    async fn list_secrets(&self) -> ClusterResult<Vec<ClusterSecret>>;

    async fn create_secret(
        &self,
        spec: &SecretSpec,
    ) -> ClusterResult<ClusterSecret>;

    async fn update_secret(
        &self,
        secret: &ClusterSecret,
        value: &str,
    ) -> ClusterResult<ClusterSecret>;

    async fn delete_secret(&self, secret: &ClusterSecret) -> ClusterResult<()>;
}
