use fr_provider::config::{AppConfig, ClusterBackend};
use serial_test::serial;
use std::env;
use std::time::Duration;

const VARS: &[&str] = &[
    "SERVER_HOST",
    "SERVER_PORT",
    "FAAS_READ_TIMEOUT_SECS",
    "FAAS_WRITE_TIMEOUT_SECS",
    "CLUSTER_BACKEND",
    "RANCHER_CATTLE_URL",
    "RANCHER_CATTLE_ACCESS_KEY",
    "RANCHER_CATTLE_SECRET_KEY",
    "RANCHER_TIMEOUT_SECS",
    "FAAS_STACK_NAME",
    "METASTORE_PATH",
    "UPGRADE_POLL_INTERVAL_MS",
    "UPGRADE_MAX_ATTEMPTS",
    "PROXY_TIMEOUT_SECS",
    "WATCHDOG_PORT",
    "PROXY_MAX_BODY_BYTES",
    "LOG_LEVEL",
    "LOG_FORMAT",
];

fn clear_env() {
    for var in VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn default_config_values() {
    clear_env();

    let config = AppConfig::load_from_env().expect("Failed to load config with defaults");

    assert_eq!(config.server_host, "0.0.0.0");
    assert_eq!(config.server_port, 8080);
    assert_eq!(config.server().read_timeout, Duration::from_secs(8));
    assert_eq!(config.server().write_timeout, Duration::from_secs(8));
    assert_eq!(config.backend(), ClusterBackend::Rancher);
    assert_eq!(config.faas_stack_name, "faas-functions");
    assert_eq!(config.metastore_path, "/metastore/store.db");
    assert_eq!(config.supervisor().poll_interval, Duration::from_secs(1));
    assert_eq!(config.supervisor().max_attempts, 30);
    assert_eq!(config.proxy().timeout, Duration::from_secs(10));
    assert_eq!(config.proxy().watchdog_port, 8080);
    assert_eq!(config.proxy().max_body_bytes, 10 * 1024 * 1024);
    assert!(!config.json_logs());
    // rancher credentials have no defaults
    assert!(config.rancher().is_err());
}

#[test]
#[serial]
fn config_loading_from_env() {
    clear_env();
    unsafe {
        env::set_var("SERVER_PORT", "3000");
        env::set_var("FAAS_READ_TIMEOUT_SECS", "2");
        env::set_var("FAAS_WRITE_TIMEOUT_SECS", "30");
        env::set_var("CLUSTER_BACKEND", "Memory");
        env::set_var("RANCHER_CATTLE_URL", "http://rancher:8080/v2-beta");
        env::set_var("RANCHER_CATTLE_ACCESS_KEY", "access");
        env::set_var("RANCHER_CATTLE_SECRET_KEY", "secret");
        env::set_var("FAAS_STACK_NAME", "functions");
        env::set_var("UPGRADE_POLL_INTERVAL_MS", "250");
        env::set_var("UPGRADE_MAX_ATTEMPTS", "20");
        env::set_var("LOG_FORMAT", "JSON");
    }

    let config = AppConfig::load_from_env().expect("Failed to load config from env");
    assert_eq!(config.server().port, 3000);
    assert_eq!(config.server().read_timeout, Duration::from_secs(2));
    assert_eq!(config.server().write_timeout, Duration::from_secs(30));
    assert_eq!(config.backend(), ClusterBackend::Memory);
    assert!(config.json_logs());

    let rancher = config.rancher().expect("rancher config");
    assert_eq!(rancher.url, "http://rancher:8080/v2-beta");
    assert_eq!(rancher.access_key, "access");
    assert_eq!(rancher.stack_name, "functions");

    let supervisor = config.supervisor();
    assert_eq!(supervisor.poll_interval, Duration::from_millis(250));
    assert_eq!(supervisor.max_attempts, 20);
    assert_eq!(
        config.proxy().function_url("echo", ""),
        "http://echo.functions:8080/"
    );

    clear_env();
}

#[test]
#[serial]
fn unknown_backend_falls_back_to_rancher() {
    clear_env();
    unsafe {
        env::set_var("CLUSTER_BACKEND", "kubernetes");
    }
    let config = AppConfig::load_from_env().expect("config");
    assert_eq!(config.backend(), ClusterBackend::Rancher);
    clear_env();
}

#[test]
#[serial]
fn invalid_number_is_rejected() {
    clear_env();
    unsafe {
        env::set_var("UPGRADE_MAX_ATTEMPTS", "many");
    }
    assert!(AppConfig::load_from_env().is_err());
    clear_env();
}
