use fr_metastore::StoreError;
use fr_models::ServiceState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Request failed with status {0}: {1}")]
    RequestFailed(reqwest::StatusCode, String),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Client configuration error: {0}")]
    ConfigurationError(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("Cluster unavailable: {0}")]
    Unavailable(String),
}

/// Errors of the provider core. Upstream and store failures carry the name
/// of the operation that produced them.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0:?} must be a valid DNS entry for service name")]
    InvalidName(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service {name} is not in active state (state: {state})")]
    InvalidState { name: String, state: ServiceState },

    #[error("Upgrade already in progress for {0}")]
    UpgradeInFlight(String),

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("Not a function: {0}")]
    NotManaged(String),

    #[error("{op}: {source}")]
    Upstream {
        op: &'static str,
        #[source]
        source: ClusterError,
    },

    #[error("{op} [metastore]: {source}")]
    Store {
        op: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Restoring metadata for {name} failed: {source}")]
    ReconcileWriteFailed {
        name: String,
        #[source]
        source: StoreError,
    },
}

pub(crate) fn upstream(
    op: &'static str,
) -> impl FnOnce(ClusterError) -> ProviderError {
    move |source| ProviderError::Upstream { op, source }
}

pub(crate) fn store(op: &'static str) -> impl FnOnce(StoreError) -> ProviderError {
    move |source| ProviderError::Store { op, source }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),
}

impl From<ProviderError> for ApiError {
    fn from(value: ProviderError) -> Self {
        let msg = value.to_string();
        match value {
            ProviderError::InvalidName(_)
            | ProviderError::InvalidInput(_)
            | ProviderError::SecretNotFound(_)
            | ProviderError::NotManaged(_) => ApiError::BadRequest(msg),
            ProviderError::NotFound(_) => ApiError::NotFound(msg),
            ProviderError::InvalidState { .. }
            | ProviderError::UpgradeInFlight(_)
            | ProviderError::Upstream { .. }
            | ProviderError::Store { .. }
            | ProviderError::ReconcileWriteFailed { .. } => {
                ApiError::InternalServerError(msg)
            }
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::{Json, http::StatusCode};
        use serde_json::json;

        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
