//! In-process cluster used for local development and tests.
//!
//! Services start `active`. An upgrade moves a service to `upgrading`; after
//! the configured number of lookups by name it reports `upgraded`, and
//! `finish_upgrade` applies the new launch configuration and returns it to
//! `active`.

use super::{ClusterClient, ClusterResult};
use crate::errors::ClusterError;
use async_trait::async_trait;
use dashmap::DashMap;
use fr_models::{
    ClusterSecret, ClusterService, LaunchConfig, ScaleUpdate, SecretSpec,
    ServiceSpec, ServiceState, ServiceUpgrade,
};
use reqwest::StatusCode;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
struct PendingUpgrade {
    launch_config: LaunchConfig,
    lookups_left: Option<u32>,
}

#[derive(Debug, Default)]
struct State {
    services: BTreeMap<String, ClusterService>,
    upgrades: BTreeMap<String, PendingUpgrade>,
    secrets: BTreeMap<String, ClusterSecret>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

pub struct MemoryCluster {
    state: Mutex<State>,
    upgrade_after: Option<u32>,
    calls: DashMap<&'static str, usize>,
    faults: DashMap<&'static str, String>,
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCluster {
    /// Upgrades complete on the first lookup after they were started.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            upgrade_after: Some(0),
            calls: DashMap::new(),
            faults: DashMap::new(),
        }
    }

    /// Report `upgrading` for `lookups` lookups before switching to
    /// `upgraded`.
    pub fn with_upgrade_after(mut self, lookups: u32) -> Self {
        self.upgrade_after = Some(lookups);
        self
    }

    /// Upgrades never leave the `upgrading` state.
    pub fn with_stuck_upgrades(mut self) -> Self {
        self.upgrade_after = None;
        self
    }

    /// Make every following call of `op` fail until [`Self::clear_fault`].
    pub fn fail(&self, op: &'static str, message: impl Into<String>) {
        self.faults.insert(op, message.into());
    }

    pub fn clear_fault(&self, op: &'static str) {
        self.faults.remove(op);
    }

    /// Number of times `op` was invoked, failed calls included.
    pub fn calls(&self, op: &str) -> usize {
        self.calls.get(op).map(|c| *c).unwrap_or(0)
    }

    /// Add a service directly, bypassing `create_service`.
    pub async fn insert_service(&self, mut service: ClusterService) {
        let mut state = self.state.lock().await;
        if service.id.is_empty() {
            service.id = state.next_id("1s");
        }
        state.services.insert(service.name.clone(), service);
    }

    pub async fn set_state(&self, name: &str, new_state: ServiceState) {
        let mut state = self.state.lock().await;
        if let Some(service) = state.services.get_mut(name) {
            service.state = new_state;
        }
    }

    pub async fn service(&self, name: &str) -> Option<ClusterService> {
        self.state.lock().await.services.get(name).cloned()
    }

    pub async fn secret_value(&self, name: &str) -> Option<String> {
        let state = self.state.lock().await;
        state.secrets.get(name).and_then(|s| s.value.clone())
    }

    fn enter(&self, op: &'static str) -> ClusterResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.faults.get(op) {
            Some(msg) => Err(ClusterError::Unavailable(msg.value().clone())),
            None => Ok(()),
        }
    }
}

fn listed(secret: &ClusterSecret) -> ClusterSecret {
    ClusterSecret {
        value: None,
        ..secret.clone()
    }
}

#[async_trait]
impl ClusterClient for MemoryCluster {
    async fn list_services(&self) -> ClusterResult<Vec<ClusterService>> {
        self.enter("list_services")?;
        let state = self.state.lock().await;
        Ok(state.services.values().cloned().collect())
    }

    async fn find_service_by_name(
        &self,
        name: &str,
    ) -> ClusterResult<Option<ClusterService>> {
        self.enter("find_service_by_name")?;
        let mut state = self.state.lock().await;
        let State {
            services, upgrades, ..
        } = &mut *state;
        let Some(service) = services.get_mut(name) else {
            return Ok(None);
        };
        if service.state == ServiceState::Upgrading {
            if let Some(pending) = upgrades.get_mut(name) {
                match pending.lookups_left {
                    Some(0) => service.state = ServiceState::Upgraded,
                    Some(ref mut left) => *left -= 1,
                    None => {}
                }
            }
        }
        Ok(Some(service.clone()))
    }

    async fn create_service(
        &self,
        spec: &ServiceSpec,
    ) -> ClusterResult<ClusterService> {
        self.enter("create_service")?;
        let mut state = self.state.lock().await;
        if state.services.contains_key(&spec.name) {
            return Err(ClusterError::RequestFailed(
                StatusCode::CONFLICT,
                format!("service {} already exists", spec.name),
            ));
        }
        let service = ClusterService {
            id: state.next_id("1s"),
            name: spec.name.clone(),
            state: if spec.start_on_create {
                ServiceState::Active
            } else {
                ServiceState::Inactive
            },
            scale: spec.scale,
            launch_config: spec.launch_config.clone(),
        };
        debug!(service = %service.name, id = %service.id, "service created");
        state.services.insert(service.name.clone(), service.clone());
        Ok(service)
    }

    async fn delete_service(&self, service: &ClusterService) -> ClusterResult<()> {
        self.enter("delete_service")?;
        let mut state = self.state.lock().await;
        let name = state
            .services
            .values()
            .find(|s| s.id == service.id)
            .map(|s| s.name.clone())
            .ok_or_else(|| ClusterError::ServiceNotFound(service.id.clone()))?;
        state.services.remove(&name);
        state.upgrades.remove(&name);
        Ok(())
    }

    async fn update_service(
        &self,
        service: &ClusterService,
        update: &ScaleUpdate,
    ) -> ClusterResult<ClusterService> {
        self.enter("update_service")?;
        let mut state = self.state.lock().await;
        let current = state
            .services
            .get_mut(&service.name)
            .ok_or_else(|| ClusterError::ServiceNotFound(service.name.clone()))?;
        current.scale = update.scale;
        Ok(current.clone())
    }

    async fn upgrade_service(
        &self,
        service: &ClusterService,
        upgrade: &ServiceUpgrade,
    ) -> ClusterResult<ClusterService> {
        self.enter("upgrade_service")?;
        let mut state = self.state.lock().await;
        let current = state
            .services
            .get_mut(&service.name)
            .ok_or_else(|| ClusterError::ServiceNotFound(service.name.clone()))?;
        if current.state != ServiceState::Active {
            return Err(ClusterError::RequestFailed(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("service {} is {}", current.name, current.state),
            ));
        }
        current.state = ServiceState::Upgrading;
        let snapshot = current.clone();
        state.upgrades.insert(
            service.name.clone(),
            PendingUpgrade {
                launch_config: upgrade.in_service_strategy.launch_config.clone(),
                lookups_left: self.upgrade_after,
            },
        );
        Ok(snapshot)
    }

    async fn finish_upgrade(
        &self,
        service: &ClusterService,
    ) -> ClusterResult<ClusterService> {
        self.enter("finish_upgrade")?;
        let mut state = self.state.lock().await;
        let State {
            services, upgrades, ..
        } = &mut *state;
        let current = services
            .get_mut(&service.name)
            .ok_or_else(|| ClusterError::ServiceNotFound(service.name.clone()))?;
        if current.state != ServiceState::Upgraded {
            return Err(ClusterError::RequestFailed(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("service {} is {}", current.name, current.state),
            ));
        }
        if let Some(pending) = upgrades.remove(&service.name) {
            current.launch_config = pending.launch_config;
        }
        current.state = ServiceState::Active;
        Ok(current.clone())
    }

    async fn list_secrets(&self) -> ClusterResult<Vec<ClusterSecret>> {
        self.enter("list_secrets")?;
        let state = self.state.lock().await;
        Ok(state.secrets.values().map(listed).collect())
    }

    async fn create_secret(
        &self,
        spec: &SecretSpec,
    ) -> ClusterResult<ClusterSecret> {
        self.enter("create_secret")?;
        let mut state = self.state.lock().await;
        if state.secrets.contains_key(&spec.name) {
            return Err(ClusterError::RequestFailed(
                StatusCode::CONFLICT,
                format!("secret {} already exists", spec.name),
            ));
        }
        let secret = ClusterSecret {
            id: state.next_id("1se"),
            name: spec.name.clone(),
            value: Some(spec.value.clone()),
        };
        state.secrets.insert(secret.name.clone(), secret.clone());
        Ok(listed(&secret))
    }

    async fn update_secret(
        &self,
        secret: &ClusterSecret,
        value: &str,
    ) -> ClusterResult<ClusterSecret> {
        self.enter("update_secret")?;
        let mut state = self.state.lock().await;
        let current = state
            .secrets
            .values_mut()
            .find(|s| s.id == secret.id)
            .ok_or_else(|| ClusterError::SecretNotFound(secret.name.clone()))?;
        current.value = Some(value.to_string());
        Ok(listed(current))
    }

    async fn delete_secret(&self, secret: &ClusterSecret) -> ClusterResult<()> {
        self.enter("delete_secret")?;
        let mut state = self.state.lock().await;
        let name = state
            .secrets
            .values()
            .find(|s| s.id == secret.id)
            .map(|s| s.name.clone())
            .ok_or_else(|| ClusterError::SecretNotFound(secret.name.clone()))?;
        state.secrets.remove(&name);
        Ok(())
    }
}
