//! HTTP gateway for the remote store API.
//!
//! # Design
//! `Gateway` holds the base URL, a `Transport`, and a `SharedToken` that the
//! session store writes. Each call is split the same way as the transport
//! types: `build_request` produces an `HttpRequest`, the transport executes
//! it once, and `parse_response` turns the `HttpResponse` into either the
//! decoded body or an `ApiError`. Both halves are pure, so request shapes
//! and error mapping are testable without a server.

use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult, NETWORK_FAILURE_MESSAGE};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError};

/// Bearer token slot shared between the session store (writer) and the
/// gateway (reader).
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl SharedToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, token: Option<String>) {
        match self.inner.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

/// Error body some endpoints return alongside a non-2xx status.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct Gateway {
    base_url: String,
    transport: Arc<dyn Transport>,
    token: SharedToken,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>, token: SharedToken) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &SharedToken {
        &self.token
    }

    /// Build a request for `path` (relative to the base URL).
    ///
    /// `content-type: application/json` is always set; `authorization` only
    /// when `bearer` is given.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        bearer: Option<&str>,
    ) -> HttpRequest {
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        if let Some(token) = bearer {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            path: format!("{}{}", self.base_url, path),
            headers,
            body,
        }
    }

    /// Interpret a response: decode 2xx bodies, map everything else.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> ApiResult<T> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Single-attempt request. The stored token is attached only when
    /// `requires_auth` is set and a token is present.
    pub fn request<T, B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        requires_auth: bool,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let token = if requires_auth { self.token.get() } else { None };
        self.request_with_bearer(method, path, body, token.as_deref())
    }

    /// Like `request`, but with an explicit bearer instead of the stored one.
    pub fn request_with_bearer<T, B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = body
            .map(|b| serde_json::to_string(b).map_err(|e| ApiError::Serialization(e.to_string())))
            .transpose()?;
        let request = self.build_request(method, path, body, bearer);
        debug!(
            method = method.as_str(),
            path,
            auth = bearer.is_some(),
            "sending request"
        );

        let response = self.transport.execute(&request).map_err(transport_error)?;
        self.parse_response(response).inspect_err(|e| {
            warn!(method = method.as_str(), path, status = ?e.status(), error = %e, "request failed");
        })
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str, requires_auth: bool) -> ApiResult<T> {
        self.request::<T, ()>(HttpMethod::Get, path, None, requires_auth)
    }

    pub fn post<T, B>(&self, path: &str, body: &B, requires_auth: bool) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Post, path, Some(body), requires_auth)
    }

    pub fn put<T, B>(&self, path: &str, body: &B, requires_auth: bool) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Put, path, Some(body), requires_auth)
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str, requires_auth: bool) -> ApiResult<T> {
        self.request::<T, ()>(HttpMethod::Delete, path, None, requires_auth)
    }
}

fn transport_error(err: TransportError) -> ApiError {
    warn!(error = %err.message, "transport failure");
    let message = if err.message.trim().is_empty() {
        NETWORK_FAILURE_MESSAGE.to_string()
    } else {
        err.message
    };
    ApiError::Transport { message }
}

/// Map a non-2xx status to `ApiError::HttpStatus`.
///
/// A body that is not a JSON object is treated as an empty one.
fn check_status(response: &HttpResponse) -> ApiResult<()> {
    if response.is_success() {
        return Ok(());
    }
    let body: ErrorBody = serde_json::from_str(&response.body).unwrap_or_default();
    let message = body
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP Error: {}", response.status));
    let code = body.code.map(|c| match c {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    });
    Err(ApiError::HttpStatus {
        status: response.status,
        message,
        code,
    })
}
