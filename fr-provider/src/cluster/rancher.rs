//! Cluster client for the Rancher (Cattle) v2-beta REST API.
//!
//! Every service created through this client lands in the functions stack,
//! which is looked up by name when the client connects and created if it
//! does not exist yet.

use super::{ClusterClient, ClusterResult};
use crate::errors::ClusterError;
use async_trait::async_trait;
use fr_models::{
    ClusterSecret, ClusterService, ScaleUpdate, SecretSpec, ServiceSpec,
    ServiceUpgrade,
};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, info};

const API_VERSION_PATH: &str = "/v2-beta";

#[derive(Debug, Clone)]
pub struct RancherConfig {
    pub url: String,
    pub access_key: String,
    pub secret_key: String,
    pub stack_name: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stack {
    #[serde(default)]
    id: String,
    name: String,
}

#[derive(Serialize)]
struct SecretValueUpdate<'a> {
    value: &'a str,
}

pub struct RancherClient {
    http: Client,
    api_root: String,
    access_key: String,
    secret_key: String,
    stack_id: String,
}

impl RancherClient {
    /// Build the client and resolve the functions stack.
    pub async fn connect(config: RancherConfig) -> ClusterResult<Self> {
        if !(config.url.starts_with("http://")
            || config.url.starts_with("https://"))
        {
            return Err(ClusterError::ConfigurationError(
                "Rancher URL must start with http:// or https://".into(),
            ));
        }
        if config.stack_name.is_empty() {
            return Err(ClusterError::ConfigurationError(
                "functions stack name cannot be empty".into(),
            ));
        }

        let http = Client::builder().timeout(config.timeout).build()?;
        let base = config.url.trim_end_matches('/');
        let base = base.strip_suffix(API_VERSION_PATH).unwrap_or(base);

        let mut client = Self {
            http,
            api_root: format!("{}{}", base, API_VERSION_PATH),
            access_key: config.access_key,
            secret_key: config.secret_key,
            stack_id: String::new(),
        };
        client.stack_id = client.resolve_stack(&config.stack_name).await?;
        info!(
            stack = %config.stack_name,
            stack_id = %client.stack_id,
            "rancher client connected"
        );
        Ok(client)
    }

    pub fn stack_id(&self) -> &str {
        &self.stack_id
    }

    async fn resolve_stack(&self, name: &str) -> ClusterResult<String> {
        let req = self
            .http
            .get(self.url("/stacks"))
            .query(&[("name", name)]);
        let stacks: Collection<Stack> = self.send(req).await?;
        if let Some(stack) = stacks.data.into_iter().next() {
            return Ok(stack.id);
        }

        info!(stack = %name, "functions stack not found, creating");
        let req = self.http.post(self.url("/stacks")).json(&Stack {
            id: String::new(),
            name: name.to_string(),
        });
        let stack: Stack = self.send(req).await?;
        Ok(stack.id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.basic_auth(&self.access_key, Some(&self.secret_key))
    }

    async fn execute(&self, req: RequestBuilder) -> ClusterResult<reqwest::Response> {
        let resp = self.authorized(req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClusterError::RequestFailed(status, body));
        }
        Ok(resp)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> ClusterResult<T> {
        let resp = self.execute(req).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ClusterClient for RancherClient {
    async fn list_services(&self) -> ClusterResult<Vec<ClusterService>> {
        let req = self
            .http
            .get(self.url("/services"))
            .query(&[("stackId", self.stack_id.as_str())]);
        let services: Collection<ClusterService> = self.send(req).await?;
        Ok(services.data)
    }

    async fn find_service_by_name(
        &self,
        name: &str,
    ) -> ClusterResult<Option<ClusterService>> {
        let req = self
            .http
            .get(self.url("/services"))
            .query(&[("name", name)]);
        let services: Collection<ClusterService> = self.send(req).await?;
        Ok(services.data.into_iter().next())
    }

    async fn create_service(
        &self,
        spec: &ServiceSpec,
    ) -> ClusterResult<ClusterService> {
        let mut spec = spec.clone();
        spec.stack_id = Some(self.stack_id.clone());
        debug!(service = %spec.name, "creating service");
        let req = self.http.post(self.url("/services")).json(&spec);
        self.send(req).await
    }

    async fn delete_service(&self, service: &ClusterService) -> ClusterResult<()> {
        let req = self
            .http
            .delete(self.url(&format!("/services/{}", service.id)));
        self.execute(req).await?;
        Ok(())
    }

    async fn update_service(
        &self,
        service: &ClusterService,
        update: &ScaleUpdate,
    ) -> ClusterResult<ClusterService> {
        let req = self
            .http
            .put(self.url(&format!("/services/{}", service.id)))
            .json(update);
        self.send(req).await
    }

    async fn upgrade_service(
        &self,
        service: &ClusterService,
        upgrade: &ServiceUpgrade,
    ) -> ClusterResult<ClusterService> {
        let req = self
            .http
            .post(self.url(&format!("/services/{}", service.id)))
            .query(&[("action", "upgrade")])
            .json(upgrade);
        self.send(req).await
    }

    async fn finish_upgrade(
        &self,
        service: &ClusterService,
    ) -> ClusterResult<ClusterService> {
        let req = self
            .http
            .post(self.url(&format!("/services/{}", service.id)))
            .query(&[("action", "finishupgrade")]);
        self.send(req).await
    }

    async fn list_secrets(&self) -> ClusterResult<Vec<ClusterSecret>> {
        let req = self.http.get(self.url("/secrets"));
        let secrets: Collection<ClusterSecret> = self.send(req).await?;
        Ok(secrets.data)
    }

    async fn create_secret(
        &self,
        spec: &SecretSpec,
    ) -> ClusterResult<ClusterSecret> {
        let req = self.http.post(self.url("/secrets")).json(spec);
        self.send(req).await
    }

    async fn update_secret(
        &self,
        secret: &ClusterSecret,
        value: &str,
    ) -> ClusterResult<ClusterSecret> {
        let req = self
            .http
            .put(self.url(&format!("/secrets/{}", secret.id)))
            .json(&SecretValueUpdate { value });
        self.send(req).await
    }

    async fn delete_secret(&self, secret: &ClusterSecret) -> ClusterResult<()> {
        let req = self
            .http
            .delete(self.url(&format!("/secrets/{}", secret.id)));
        self.execute(req).await?;
        Ok(())
    }
}
