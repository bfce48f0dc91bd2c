//! Invocation proxy.
//!
//! `POST /function/{name}` is forwarded to the function's watchdog inside
//! the functions stack, and the watchdog's response is relayed back.

use crate::{config::ProxyConfig, errors::ApiError, server::AppState};
use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    response::Response,
};
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct FunctionProxy {
    client: Client,
    config: ProxyConfig,
}

impl FunctionProxy {
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    async fn forward(
        &self,
        name: &str,
        path: &str,
        uri: &Uri,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Response, ApiError> {
        let query = uri.query().map(|q| format!("?{}", q)).unwrap_or_default();
        let target_url = format!("{}{}", self.config.function_url(name, path), query);
        debug!(function = %name, url = %target_url, "proxying invocation");

        let started = Instant::now();
        let response = self
            .client
            .post(&target_url)
            .headers(forwarded(headers, true))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(function = %name, error = %e, "can't reach function");
                ApiError::BadGateway(format!("can't reach service: {}", name))
            })?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let resp_headers = forwarded(response.headers(), false);
        let bytes = response.bytes().await.map_err(|e| {
            error!(function = %name, error = %e, "failed to read function response");
            ApiError::BadGateway(format!("Failed to read response of {}", name))
        })?;
        info!(
            function = %name,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "invocation finished"
        );

        let mut builder = Response::builder().status(status);
        if let Some(h) = builder.headers_mut() {
            h.extend(resp_headers);
        }
        builder
            .body(Body::from(bytes))
            .map_err(|e| ApiError::InternalServerError(format!("Failed to build response: {}", e)))
    }
}

/// Copy headers minus hop-by-hop ones. Requests also drop `host`.
fn forwarded(source: &HeaderMap, request: bool) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(source.len());
    for (name, value) in source.iter() {
        let hop_by_hop = matches!(
            name.as_str(),
            "connection" | "keep-alive" | "transfer-encoding" | "te" | "trailer" | "upgrade"
        );
        if hop_by_hop || (request && name.as_str() == "host") {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

// Bodies arrive through the `Bytes` extractor, so oversized invocations are
// refused with 413 by the router's `DefaultBodyLimit`.
pub async fn invoke_function(
    State(state): State<AppState>,
    Path(name): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.proxy.forward(&name, "", &uri, &headers, body).await
}

pub async fn invoke_function_path(
    State(state): State<AppState>,
    Path((name, path)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.proxy.forward(&name, &path, &uri, &headers, body).await
}
