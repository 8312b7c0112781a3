//! Forwarding gateway module
//!
//! Proxies a GET to a configured upstream URL and relays its status and body.
//! Any upstream answer is relayed, including 4xx and 5xx. Only a failed call
//! turns into the fixed 406 response.

use crate::config::{ForwardEntry, ForwardSettings};
use axum::{
    body::{Body, Bytes},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Body sent when the upstream call fails
pub const FORWARD_ERROR_BODY: &str = "Forwarded response returned an error.";

/// Path served for a forward entry
pub fn forward_path(name: &str) -> String {
    format!("/forward/{}", name)
}

/// Failure of the upstream call itself
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} timed out")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ForwardError {
    fn from_send(url: &str, source: reqwest::Error) -> Self {
        let url = url.to_string();
        if source.is_timeout() {
            Self::Timeout { url, source }
        } else if source.is_connect() {
            Self::Connect { url, source }
        } else {
            Self::Request { url, source }
        }
    }

    fn from_body(url: &str, source: reqwest::Error) -> Self {
        let url = url.to_string();
        if source.is_timeout() {
            Self::Timeout { url, source }
        } else {
            Self::Body { url, source }
        }
    }
}

/// Whatever the upstream answered, success or not
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);

        let mut builder = Response::builder().status(status);
        if let Some(content_type) = self.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }

        match builder.body(Body::from(self.body)) {
            Ok(response) => response.into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build relayed response");
                forward_error_response()
            }
        }
    }
}

/// Build the shared upstream client
pub fn build_client(settings: &ForwardSettings) -> reqwest::Result<Client> {
    Client::builder().timeout(settings.timeout).build()
}

/// Handler state for one forward route
#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    entry: Arc<ForwardEntry>,
}

impl Forwarder {
    pub fn new(client: Client, entry: Arc<ForwardEntry>) -> Self {
        Self { client, entry }
    }

    /// Issue a bare GET to the target URL
    pub async fn forward(&self) -> Result<UpstreamResponse, ForwardError> {
        let url = self.entry.target_url.as_str();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ForwardError::from_send(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| ForwardError::from_body(url, e))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }

    /// Forward and turn the outcome into the client-facing response
    pub async fn handle(&self) -> axum::response::Response {
        let start = Instant::now();
        let result = self.forward().await;
        let latency = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(upstream) => {
                tracing::info!(
                    name = %self.entry.name,
                    target = %self.entry.target_url,
                    status = %upstream.status,
                    latency_ms = %latency,
                    "Forwarded request"
                );
                upstream.into_response()
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    name = %self.entry.name,
                    target = %self.entry.target_url,
                    latency_ms = %latency,
                    "Forward error"
                );
                forward_error_response()
            }
        }
    }
}

fn forward_error_response() -> axum::response::Response {
    (StatusCode::NOT_ACCEPTABLE, FORWARD_ERROR_BODY).into_response()
}
