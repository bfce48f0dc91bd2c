use serde::{Deserialize, Serialize};

/// Secret as submitted by the gateway. A request without a value is a
/// delete request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SecretRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Listing entry; secret values never leave the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct SecretView {
    pub name: String,
}
