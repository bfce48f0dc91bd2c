use crate::cluster::RancherConfig;
use crate::services::SupervisorSettings;
use anyhow::{Result, anyhow};
use envconfig::Envconfig;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Envconfig)]
pub struct AppConfig {
    // Server configuration
    #[envconfig(from = "SERVER_HOST", default = "0.0.0.0")]
    pub server_host: String,

    #[envconfig(from = "SERVER_PORT", default = "8080")]
    pub server_port: u16,

    #[envconfig(from = "FAAS_READ_TIMEOUT_SECS", default = "8")]
    pub read_timeout_seconds: u64,

    #[envconfig(from = "FAAS_WRITE_TIMEOUT_SECS", default = "8")]
    pub write_timeout_seconds: u64,

    // Cluster configuration
    #[envconfig(from = "CLUSTER_BACKEND", default = "rancher")]
    pub cluster_backend: String,

    #[envconfig(from = "RANCHER_CATTLE_URL")]
    pub rancher_cattle_url: Option<String>,

    #[envconfig(from = "RANCHER_CATTLE_ACCESS_KEY")]
    pub rancher_cattle_access_key: Option<String>,

    #[envconfig(from = "RANCHER_CATTLE_SECRET_KEY")]
    pub rancher_cattle_secret_key: Option<String>,

    #[envconfig(from = "RANCHER_TIMEOUT_SECS", default = "30")]
    pub rancher_timeout_seconds: u64,

    #[envconfig(from = "FAAS_STACK_NAME", default = "faas-functions")]
    pub faas_stack_name: String,

    // Metadata store
    #[envconfig(from = "METASTORE_PATH", default = "/metastore/store.db")]
    pub metastore_path: String,

    // Upgrade supervisor
    #[envconfig(from = "UPGRADE_POLL_INTERVAL_MS", default = "1000")]
    pub upgrade_poll_interval_ms: u64,

    #[envconfig(from = "UPGRADE_MAX_ATTEMPTS", default = "30")]
    pub upgrade_max_attempts: u32,

    // Function proxy
    #[envconfig(from = "PROXY_TIMEOUT_SECS", default = "10")]
    pub proxy_timeout_seconds: u64,

    #[envconfig(from = "WATCHDOG_PORT", default = "8080")]
    pub watchdog_port: u16,

    #[envconfig(from = "PROXY_MAX_BODY_BYTES", default = "10485760")]
    pub proxy_max_body_bytes: usize,

    // Logging
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    #[envconfig(from = "LOG_FORMAT", default = "plain")]
    pub log_format: String,
}

impl AppConfig {
    /// Load configuration from environment variables only
    pub fn load_from_env() -> Result<Self> {
        Ok(Self::init_from_env()?)
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            host: self.server_host.clone(),
            port: self.server_port,
            read_timeout: Duration::from_secs(self.read_timeout_seconds),
            write_timeout: Duration::from_secs(self.write_timeout_seconds),
        }
    }

    pub fn backend(&self) -> ClusterBackend {
        match self.cluster_backend.to_lowercase().as_str() {
            "rancher" => ClusterBackend::Rancher,
            "memory" => ClusterBackend::Memory,
            other => {
                warn!(
                    "Unrecognized cluster backend '{}', falling back to 'rancher'.",
                    other
                );
                ClusterBackend::Rancher
            }
        }
    }

    /// Rancher connection settings. The URL and both keys are required.
    pub fn rancher(&self) -> Result<RancherConfig> {
        let required = |value: &Option<String>, var: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{} must be set for the rancher backend", var))
        };
        Ok(RancherConfig {
            url: required(&self.rancher_cattle_url, "RANCHER_CATTLE_URL")?,
            access_key: required(
                &self.rancher_cattle_access_key,
                "RANCHER_CATTLE_ACCESS_KEY",
            )?,
            secret_key: required(
                &self.rancher_cattle_secret_key,
                "RANCHER_CATTLE_SECRET_KEY",
            )?,
            stack_name: self.faas_stack_name.clone(),
            timeout: Duration::from_secs(self.rancher_timeout_seconds),
        })
    }

    pub fn supervisor(&self) -> SupervisorSettings {
        SupervisorSettings {
            poll_interval: Duration::from_millis(self.upgrade_poll_interval_ms),
            max_attempts: self.upgrade_max_attempts,
        }
    }

    pub fn proxy(&self) -> ProxyConfig {
        ProxyConfig {
            stack_name: self.faas_stack_name.clone(),
            watchdog_port: self.watchdog_port,
            timeout: Duration::from_secs(self.proxy_timeout_seconds),
            max_body_bytes: self.proxy_max_body_bytes,
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for receiving a request body.
    pub read_timeout: Duration,
    /// Upper bound for producing a response.
    pub write_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterBackend {
    Rancher,
    Memory,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub stack_name: String,
    pub watchdog_port: u16,
    pub timeout: Duration,
    pub max_body_bytes: usize,
}

impl ProxyConfig {
    /// Watchdog address of a function inside the functions stack.
    pub fn function_url(&self, name: &str, path: &str) -> String {
        format!(
            "http://{}.{}:{}/{}",
            name,
            self.stack_name,
            self.watchdog_port,
            path.trim_start_matches('/')
        )
    }
}
