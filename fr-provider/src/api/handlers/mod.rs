pub mod functions;
pub mod proxy;
pub mod secrets;
pub mod system;

pub use functions::*;
pub use proxy::*;
pub use secrets::*;
pub use system::*;

use crate::errors::{ApiError, ProviderError};
use tracing::{error, warn};

/// Convert a provider error for the response, logging it with the
/// operation that failed.
pub(crate) fn reject(op: &'static str) -> impl FnOnce(ProviderError) -> ApiError {
    move |e| {
        let api = ApiError::from(e);
        match &api {
            ApiError::InternalServerError(_) | ApiError::BadGateway(_) => {
                error!(op, error = %api, "request failed")
            }
            _ => warn!(op, error = %api, "request rejected"),
        }
        api
    }
}
