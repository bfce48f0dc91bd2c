use crate::server::AppState;
use axum::{Json, extract::State};
use serde_json::{Value, json};

/// Commit the binary was built from, injected through `GIT_SHA` at build
/// time.
pub const COMMIT_SHA: &str = match option_env!("GIT_SHA") {
    Some(sha) => sha,
    None => "n/a",
};

pub async fn provider_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "provider": {
            "provider": "fr-provider",
            "orchestration": state.orchestration,
            "version": {
                "sha": COMMIT_SHA,
                "release": env!("CARGO_PKG_VERSION"),
            }
        }
    }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "fr-provider",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
