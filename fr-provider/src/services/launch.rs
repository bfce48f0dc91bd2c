use crate::cluster::ClusterClient;
use crate::errors::{ProviderError, upstream};
use fr_models::{
    ENV_PROCESS_KEY, FUNCTION_MARKER_LABEL, FunctionDefinition, IMAGE_PREFIX,
    LaunchConfig, PULL_IMAGE_LABEL, SecretReference, ServiceSpec,
};

/// Build the cluster launch configuration for `definition`.
///
/// Secret names are resolved against the secrets currently known to the
/// cluster; an unknown name fails the whole build.
pub async fn build_launch_config(
    cluster: &dyn ClusterClient,
    definition: &FunctionDefinition,
) -> Result<LaunchConfig, ProviderError> {
    let mut environment = definition.env_vars.clone();
    if let Some(process) = definition
        .env_process
        .as_ref()
        .filter(|p| !p.is_empty())
    {
        environment.insert(ENV_PROCESS_KEY.to_string(), process.clone());
    }

    let mut labels = definition.labels.clone();
    labels.insert(FUNCTION_MARKER_LABEL.to_string(), definition.name.clone());
    labels.insert(PULL_IMAGE_LABEL.to_string(), "always".to_string());

    let secrets = resolve_secrets(cluster, &definition.secrets).await?;

    Ok(LaunchConfig {
        image_uuid: format!("{}{}", IMAGE_PREFIX, definition.image),
        environment,
        labels,
        secrets,
    })
}

pub fn service_spec(
    definition: &FunctionDefinition,
    launch_config: LaunchConfig,
) -> ServiceSpec {
    ServiceSpec {
        name: definition.name.clone(),
        scale: 1,
        start_on_create: true,
        launch_config,
        stack_id: None,
    }
}

async fn resolve_secrets(
    cluster: &dyn ClusterClient,
    names: &[String],
) -> Result<Vec<SecretReference>, ProviderError> {
    if names.is_empty() {
        return Ok(vec![]);
    }
    let known = cluster
        .list_secrets()
        .await
        .map_err(upstream("ListSecrets"))?;
    names
        .iter()
        .map(|name| {
            known
                .iter()
                .find(|s| &s.name == name)
                .map(|s| SecretReference {
                    secret_id: s.id.clone(),
                    name: s.name.clone(),
                })
                .ok_or_else(|| ProviderError::SecretNotFound(name.clone()))
        })
        .collect()
}
