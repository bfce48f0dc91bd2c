//! Cluster-side view of functions: services, launch configurations and
//! secrets as exchanged with the orchestrator API.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Label attached to every launch configuration created by the provider.
/// Its presence marks a service as a managed function.
pub const FUNCTION_MARKER_LABEL: &str = "faas_function";
pub const PULL_IMAGE_LABEL: &str = "io.rancher.container.pull_image";
/// Environment entry read by the function watchdog to pick the process.
pub const ENV_PROCESS_KEY: &str = "fprocess";
pub const IMAGE_PREFIX: &str = "docker:";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceState {
    Active,
    Upgrading,
    Upgraded,
    #[default]
    Inactive,
    Other(String),
}

impl ServiceState {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceState::Active => "active",
            ServiceState::Upgrading => "upgrading",
            ServiceState::Upgraded => "upgraded",
            ServiceState::Inactive => "inactive",
            ServiceState::Other(s) => s,
        }
    }
}

impl From<String> for ServiceState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => ServiceState::Active,
            "upgrading" => ServiceState::Upgrading,
            "upgraded" => ServiceState::Upgraded,
            "inactive" => ServiceState::Inactive,
            _ => ServiceState::Other(value),
        }
    }
}

impl From<&str> for ServiceState {
    fn from(value: &str) -> Self {
        ServiceState::from(value.to_string())
    }
}

impl From<ServiceState> for String {
    fn from(value: ServiceState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    pub secret_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    #[serde(default)]
    pub image_uuid: String,
    #[serde(default, deserialize_with = "string_map_lossy")]
    pub environment: HashMap<String, String>,
    #[serde(default, deserialize_with = "string_map_lossy")]
    pub labels: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<SecretReference>,
}

impl LaunchConfig {
    /// Image reference without the runtime prefix added on deploy.
    pub fn image(&self) -> &str {
        self.image_uuid
            .strip_prefix(IMAGE_PREFIX)
            .unwrap_or(&self.image_uuid)
    }

    pub fn env_process(&self) -> Option<&str> {
        self.environment.get(ENV_PROCESS_KEY).map(String::as_str)
    }
}

/// Live representation of a deployment on the cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterService {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: ServiceState,
    #[serde(default)]
    pub scale: u64,
    #[serde(default)]
    pub launch_config: LaunchConfig,
}

impl ClusterService {
    pub fn is_function(&self) -> bool {
        self.launch_config
            .labels
            .contains_key(FUNCTION_MARKER_LABEL)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub name: String,
    pub scale: u64,
    pub start_on_create: bool,
    pub launch_config: LaunchConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InServiceUpgradeStrategy {
    pub batch_size: u32,
    pub start_first: bool,
    pub launch_config: LaunchConfig,
    #[serde(default)]
    pub secondary_launch_configs: Vec<LaunchConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpgrade {
    pub in_service_strategy: InServiceUpgradeStrategy,
}

impl ServiceUpgrade {
    /// Rolling replacement one container at a time, new container first.
    pub fn rolling(launch_config: LaunchConfig) -> Self {
        Self {
            in_service_strategy: InServiceUpgradeStrategy {
                batch_size: 1,
                start_first: true,
                launch_config,
                secondary_launch_configs: vec![],
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScaleUpdate {
    pub scale: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSecret {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecretSpec {
    pub name: String,
    pub value: String,
}

/// Keeps only string values; the orchestrator reports environment and
/// label maps with untyped values.
fn string_map_lossy<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, serde_json::Value>> =
        Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_rancher_service_payload() {
        let service: ClusterService = serde_json::from_value(json!({
            "id": "1s5",
            "name": "echo",
            "state": "upgraded",
            "scale": 2,
            "launchConfig": {
                "imageUuid": "docker:alpine:latest",
                "environment": { "fprocess": "cat", "PORT": 8080 },
                "labels": { "faas_function": "echo" }
            },
            "type": "service"
        }))
        .unwrap();

        assert_eq!(service.state, ServiceState::Upgraded);
        assert_eq!(service.scale, 2);
        assert!(service.is_function());
        assert_eq!(service.launch_config.image(), "alpine:latest");
        assert_eq!(service.launch_config.env_process(), Some("cat"));
        // non-string environment values are dropped
        assert!(!service.launch_config.environment.contains_key("PORT"));
    }

    #[test]
    fn null_maps_are_empty() {
        let service: ClusterService = serde_json::from_value(json!({
            "name": "db",
            "state": "active",
            "launchConfig": { "imageUuid": "docker:postgres", "labels": null }
        }))
        .unwrap();
        assert!(!service.is_function());
        assert!(service.launch_config.environment.is_empty());
    }

    #[test]
    fn unknown_state_is_preserved() {
        let state = ServiceState::from("restarting");
        assert_eq!(state, ServiceState::Other("restarting".into()));
        assert_eq!(String::from(state), "restarting");
    }

    #[test]
    fn upgrade_is_rolling_start_first() {
        let body = serde_json::to_value(ServiceUpgrade::rolling(
            LaunchConfig::default(),
        ))
        .unwrap();
        assert_eq!(body["inServiceStrategy"]["batchSize"], 1);
        assert_eq!(body["inServiceStrategy"]["startFirst"], true);
    }
}
