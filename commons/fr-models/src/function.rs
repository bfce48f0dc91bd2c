use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Desired definition of a deployed function.
///
/// The same shape is accepted as the deploy/update request body and is
/// persisted as-is by the metadata store, keyed by `name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    #[serde(rename = "service")]
    #[validate(length(min = 1, message = "Function name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Image cannot be empty"))]
    pub image: String,
    /// Overrides the process started by the function watchdog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_process: Option<String>,
    #[serde(default)]
    pub env_vars: HashMap<String, String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub secrets: Vec<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl FunctionDefinition {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Function as reported to the gateway: the stored definition merged with
/// the replica count observed on the cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionView {
    pub name: String,
    pub image: String,
    pub invocation_count: u64,
    pub replicas: u64,
    pub available_replicas: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_process: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env_vars: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
}

impl FunctionView {
    pub fn from_definition(definition: FunctionDefinition, replicas: u64) -> Self {
        Self {
            name: definition.name,
            image: definition.image,
            invocation_count: 0,
            replicas,
            available_replicas: replicas,
            env_process: definition.env_process,
            env_vars: definition.env_vars,
            constraints: definition.constraints,
            secrets: definition.secrets,
            labels: definition.labels,
            annotations: definition.annotations,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFunctionRequest {
    pub function_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScaleServiceRequest {
    #[serde(default)]
    pub service_name: String,
    pub replicas: u64,
}
