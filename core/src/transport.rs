//! Execution of `HttpRequest` values.
//!
//! The gateway never talks to the network itself. It hands a fully built
//! request to a `Transport` and interprets whatever comes back. A transport
//! only fails when no HTTP response was obtained; 4xx/5xx statuses are
//! returned as data so the gateway can apply its own error mapping.

use thiserror::Error;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// The request could not be delivered or no response was received.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Executes a single HTTP round-trip. No retries, no timeouts.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent is configured with `http_status_as_error(false)` so non-2xx
/// responses come back as `HttpResponse` values.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match request.method {
            HttpMethod::Get | HttpMethod::Delete => {
                let mut builder = if request.method == HttpMethod::Get {
                    self.agent.get(&request.path)
                } else {
                    self.agent.delete(&request.path)
                };
                for (key, value) in &request.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post | HttpMethod::Put => {
                let mut builder = if request.method == HttpMethod::Post {
                    self.agent.post(&request.path)
                } else {
                    self.agent.put(&request.path)
                };
                for (key, value) in &request.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::new(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
