pub mod launch;
pub mod orchestrator;
pub mod reconciler;
pub mod secrets;
pub mod supervisor;

pub use orchestrator::Orchestrator;
pub use reconciler::Reconciler;
pub use secrets::SecretSynchronizer;
pub use supervisor::{
    SupervisorSettings, UpgradeEvent, UpgradePhase, UpgradeSupervisor,
};
