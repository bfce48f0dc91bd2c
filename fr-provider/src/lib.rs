pub mod api;
pub mod bootstrap;
pub mod cluster;
pub mod config;
pub mod errors;
pub mod server;
pub mod services;

pub use config::*;
pub use errors::*;
pub use server::{ApiServer, AppState};

pub use cluster::{ClusterClient, MemoryCluster, RancherClient};
pub use services::{
    Orchestrator, Reconciler, SecretSynchronizer, UpgradeEvent, UpgradePhase,
    UpgradeSupervisor,
};

pub use bootstrap::{Provider, build_provider, build_provider_from_env};
