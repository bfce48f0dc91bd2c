use anyhow::Result;
use clap::Command;
use fr_provider::{bootstrap::build_provider, config::AppConfig};
use tracing::{error, info};

fn init_log(config: &AppConfig) {
    use tracing_subscriber::{
        EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let _matches = Command::new("fr-provider")
        .about("OpenFaaS provider backed by Rancher")
        .version(env!("CARGO_PKG_VERSION"))
        .get_matches();

    let config = AppConfig::load_from_env()?;
    init_log(&config);
    info!(
        backend = %config.cluster_backend,
        stack = %config.faas_stack_name,
        metastore = %config.metastore_path,
        "starting provider"
    );

    let provider = build_provider(&config).await?;
    let served = provider.server.serve_with_shutdown(shutdown_signal()).await;
    if let Err(e) = provider.store.close() {
        error!("Failed to close metadata store: {}", e);
    }
    if let Err(e) = served {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
