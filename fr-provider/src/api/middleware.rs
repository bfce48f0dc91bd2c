use crate::config::ServerConfig;
use tower::{
    ServiceBuilder,
    layer::util::{Identity, Stack},
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

pub type MiddlewareStack = ServiceBuilder<
    Stack<
        TimeoutLayer,
        Stack<
            RequestBodyTimeoutLayer,
            Stack<TraceLayer<SharedClassifier<ServerErrorsAsFailures>>, Identity>,
        >,
    >,
>;

/// Tracing, then the read (request body) and write (whole response)
/// timeouts. A request over the write timeout is answered with 408.
pub fn create_middleware_stack(config: &ServerConfig) -> MiddlewareStack {
    ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyTimeoutLayer::new(config.read_timeout))
        .layer(TimeoutLayer::new(config.write_timeout))
}
