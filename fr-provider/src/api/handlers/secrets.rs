use super::reject;
use crate::{errors::ApiError, server::AppState};
use axum::{Json, extract::State, http::StatusCode};
use fr_models::{SecretRequest, SecretView};

pub async fn list_secrets(
    State(state): State<AppState>,
) -> Result<Json<Vec<SecretView>>, ApiError> {
    let secrets = state.secrets.list().await.map_err(reject("ListSecrets"))?;
    Ok(Json(secrets))
}

/// Create the secret or replace its value.
pub async fn upsert_secret(
    State(state): State<AppState>,
    Json(request): Json<SecretRequest>,
) -> Result<StatusCode, ApiError> {
    let Some(value) = request.value.as_deref().filter(|v| !v.is_empty()) else {
        return Err(ApiError::BadRequest(format!(
            "value is required for secret {:?}",
            request.name
        )));
    };
    state
        .secrets
        .upsert(&request.name, value)
        .await
        .map_err(reject("UpsertSecret"))?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn delete_secret(
    State(state): State<AppState>,
    Json(request): Json<SecretRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .secrets
        .remove(&request.name)
        .await
        .map_err(reject("DeleteSecret"))?;
    Ok(StatusCode::ACCEPTED)
}
