use super::reject;
use crate::{errors::ApiError, server::AppState};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use fr_models::{
    DeleteFunctionRequest, FunctionDefinition, FunctionView, ScaleServiceRequest,
};
use tracing::info;

pub async fn list_functions(
    State(state): State<AppState>,
) -> Result<Json<Vec<FunctionView>>, ApiError> {
    let functions = state
        .reconciler
        .list_functions()
        .await
        .map_err(reject("ListFunctions"))?;
    Ok(Json(functions))
}

pub async fn get_function(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<FunctionView>, ApiError> {
    let function = state
        .reconciler
        .find_function(&name)
        .await
        .map_err(reject("FindFunction"))?;
    Ok(Json(function))
}

pub async fn deploy_function(
    State(state): State<AppState>,
    Json(definition): Json<FunctionDefinition>,
) -> Result<StatusCode, ApiError> {
    info!(function = %definition.name, image = %definition.image, "API: deploy function");
    state
        .orchestrator
        .deploy(&definition)
        .await
        .map_err(reject("DeployFunction"))?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn update_function(
    State(state): State<AppState>,
    Json(definition): Json<FunctionDefinition>,
) -> Result<StatusCode, ApiError> {
    info!(function = %definition.name, image = %definition.image, "API: update function");
    state
        .orchestrator
        .update(&definition)
        .await
        .map_err(reject("UpdateFunction"))?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn delete_function(
    State(state): State<AppState>,
    Json(request): Json<DeleteFunctionRequest>,
) -> Result<StatusCode, ApiError> {
    if request.function_name.is_empty() {
        return Err(ApiError::BadRequest("functionName is required".into()));
    }
    info!(function = %request.function_name, "API: delete function");
    state
        .orchestrator
        .delete(&request.function_name)
        .await
        .map_err(reject("DeleteFunction"))?;
    Ok(StatusCode::OK)
}

pub async fn scale_function(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<ScaleServiceRequest>,
) -> Result<StatusCode, ApiError> {
    info!(function = %name, replicas = request.replicas, "API: scale function");
    state
        .orchestrator
        .scale(&name, request.replicas)
        .await
        .map_err(reject("ScaleFunction"))?;
    Ok(StatusCode::ACCEPTED)
}
