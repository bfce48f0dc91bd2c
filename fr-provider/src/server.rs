use crate::{
    api::{FunctionProxy, create_middleware_stack, handlers},
    config::ServerConfig,
    services::{Orchestrator, Reconciler, SecretSynchronizer},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
    pub orchestrator: Arc<Orchestrator>,
    pub secrets: Arc<SecretSynchronizer>,
    pub proxy: Arc<FunctionProxy>,
    /// Reported by the info endpoint.
    pub orchestration: &'static str,
}

pub struct ApiServer {
    app: Router,
    config: ServerConfig,
}

impl ApiServer {
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        let invocation = Router::new()
            .route("/function/{name}", post(handlers::invoke_function))
            .route(
                "/function/{name}/{*path}",
                post(handlers::invoke_function_path),
            )
            .layer(DefaultBodyLimit::max(state.proxy.config().max_body_bytes));

        let app = Router::new()
            // Function management
            .route(
                "/system/functions",
                get(handlers::list_functions)
                    .post(handlers::deploy_function)
                    .put(handlers::update_function)
                    .delete(handlers::delete_function),
            )
            .route("/system/function/{name}", get(handlers::get_function))
            .route(
                "/system/scale-function/{name}",
                post(handlers::scale_function),
            )
            // Secrets
            .route(
                "/system/secrets",
                get(handlers::list_secrets)
                    .post(handlers::upsert_secret)
                    .put(handlers::upsert_secret)
                    .delete(handlers::delete_secret),
            )
            .merge(invocation)
            .route("/system/info", get(handlers::provider_info))
            .route("/healthz", get(handlers::health_check))
            .layer(create_middleware_stack(&config))
            .with_state(state);

        Self { app, config }
    }

    /// Serve until `signal` resolves; in-flight requests are drained.
    pub async fn serve_with_shutdown(
        self,
        signal: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let addr: SocketAddr =
            format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Provider API server listening on {}", addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(signal)
            .await?;
        Ok(())
    }

    /// Consume and return the underlying Axum Router so callers can serve it
    /// themselves or drive it directly in tests.
    pub fn into_router(self) -> Router {
        self.app
    }
}
