//! Completion supervisor for rolling upgrades.
//!
//! Starting an upgrade only moves a service to `upgrading`; the upgrade has
//! to be confirmed with finish-upgrade once the cluster reports `upgraded`.
//! A supervisor task polls the service at a fixed interval, finishes the
//! upgrade when it is ready and gives up after a bounded number of polls.
//! At most one supervisor runs per function name.

use crate::cluster::ClusterClient;
use crate::errors::ProviderError;
use dashmap::DashSet;
use fr_models::ServiceState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradePhase {
    /// Upgrade accepted by the cluster, polling not started yet.
    Upgrading,
    Polling { attempts_left: u32 },
    /// finish-upgrade was accepted.
    Finished,
    /// Attempts exhausted without observing `upgraded`.
    TimedOut,
    /// finish-upgrade was rejected.
    Failed,
}

impl UpgradePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UpgradePhase::Finished | UpgradePhase::TimedOut | UpgradePhase::Failed
        )
    }
}

/// Inputs driving [`transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Start { max_attempts: u32 },
    /// The service was looked up and is not `upgraded` yet (or is gone).
    Pending,
    LookupFailed,
    FinishAccepted,
    FinishRejected,
}

/// Pure state transition of a supervisor. Every poll, failed or not,
/// consumes one attempt.
pub fn transition(phase: UpgradePhase, signal: Signal) -> UpgradePhase {
    use UpgradePhase::*;
    match (phase, signal) {
        (Upgrading, Signal::Start { max_attempts: 0 }) => TimedOut,
        (Upgrading, Signal::Start { max_attempts }) => Polling {
            attempts_left: max_attempts,
        },
        (Polling { attempts_left }, Signal::Pending | Signal::LookupFailed) => {
            if attempts_left <= 1 {
                TimedOut
            } else {
                Polling {
                    attempts_left: attempts_left - 1,
                }
            }
        }
        (Polling { .. }, Signal::FinishAccepted) => Finished,
        (Polling { .. }, Signal::FinishRejected) => Failed,
        (phase, _) => phase,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeEvent {
    pub function: String,
    pub phase: UpgradePhase,
}

#[derive(Debug, Clone, Copy)]
pub struct SupervisorSettings {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_attempts: 30,
        }
    }
}

/// Claim on a function name; released when dropped.
#[derive(Debug)]
pub struct UpgradeSlot {
    name: String,
    in_flight: Arc<DashSet<String>>,
}

impl UpgradeSlot {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for UpgradeSlot {
    fn drop(&mut self) {
        self.in_flight.remove(&self.name);
    }
}

pub struct UpgradeSupervisor {
    cluster: Arc<dyn ClusterClient>,
    settings: SupervisorSettings,
    in_flight: Arc<DashSet<String>>,
    events: broadcast::Sender<UpgradeEvent>,
}

impl UpgradeSupervisor {
    pub fn new(cluster: Arc<dyn ClusterClient>, settings: SupervisorSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            cluster,
            settings,
            in_flight: Arc::new(DashSet::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UpgradeEvent> {
        self.events.subscribe()
    }

    pub fn is_in_flight(&self, name: &str) -> bool {
        self.in_flight.contains(name)
    }

    /// Reserve `name` for a new upgrade.
    pub fn try_claim(&self, name: &str) -> Result<UpgradeSlot, ProviderError> {
        if !self.in_flight.insert(name.to_string()) {
            return Err(ProviderError::UpgradeInFlight(name.to_string()));
        }
        Ok(UpgradeSlot {
            name: name.to_string(),
            in_flight: self.in_flight.clone(),
        })
    }

    /// Spawn the polling task. The slot is held until the task reaches a
    /// terminal phase.
    pub fn launch(&self, slot: UpgradeSlot) -> JoinHandle<UpgradePhase> {
        let cluster = self.cluster.clone();
        let settings = self.settings;
        let events = self.events.clone();
        tokio::spawn(supervise(cluster, settings, events, slot))
    }
}

fn publish(
    events: &broadcast::Sender<UpgradeEvent>,
    function: &str,
    phase: UpgradePhase,
) {
    debug!(function = %function, phase = ?phase, "upgrade phase changed");
    // no subscribers is fine
    let _ = events.send(UpgradeEvent {
        function: function.to_string(),
        phase,
    });
}

async fn poll_once(cluster: &dyn ClusterClient, name: &str) -> Signal {
    let service = match cluster.find_service_by_name(name).await {
        Ok(Some(service)) => service,
        Ok(None) => {
            warn!(function = %name, "service disappeared during upgrade");
            return Signal::Pending;
        }
        Err(e) => {
            warn!(function = %name, op = "FindServiceByName", error = %e, "poll failed");
            return Signal::LookupFailed;
        }
    };

    if service.state != ServiceState::Upgraded {
        debug!(function = %name, state = %service.state, "upgrade still in progress");
        return Signal::Pending;
    }

    match cluster.finish_upgrade(&service).await {
        Ok(_) => Signal::FinishAccepted,
        Err(e) => {
            error!(function = %name, op = "FinishUpgrade", error = %e, "could not finish upgrade");
            Signal::FinishRejected
        }
    }
}

async fn supervise(
    cluster: Arc<dyn ClusterClient>,
    settings: SupervisorSettings,
    events: broadcast::Sender<UpgradeEvent>,
    slot: UpgradeSlot,
) -> UpgradePhase {
    let name = slot.name().to_string();
    info!(function = %name, max_attempts = settings.max_attempts, "waiting for upgrade to finish");

    let mut phase = UpgradePhase::Upgrading;
    publish(&events, &name, phase);
    phase = transition(
        phase,
        Signal::Start {
            max_attempts: settings.max_attempts,
        },
    );

    while !phase.is_terminal() {
        publish(&events, &name, phase);
        tokio::time::sleep(settings.poll_interval).await;
        let signal = poll_once(cluster.as_ref(), &name).await;
        phase = transition(phase, signal);
    }

    match phase {
        UpgradePhase::Finished => info!(function = %name, "upgrade finished"),
        UpgradePhase::TimedOut => {
            warn!(function = %name, attempts = settings.max_attempts, "upgrade poll timed out")
        }
        _ => error!(function = %name, phase = ?phase, "upgrade supervisor stopped"),
    }

    drop(slot);
    publish(&events, &name, phase);
    phase
}
