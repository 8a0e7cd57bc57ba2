//! Verb-scoped HTTP client bound to one base address.
//!
//! # Design
//! `ApiClient` holds the base address and a `Transport` and carries no
//! mutable state between calls. Every call goes through the same three steps:
//! `build_request` produces an `HttpRequest` (pure), the transport executes it,
//! and `check_status` splits the outcome into the raw response or a `Failure`.
//! Failures are normalized before they leave this module, so callers only ever
//! see `Result<HttpResponse, NormalizedError>`.

use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{normalize, Failure, NormalizedError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

#[derive(Debug, Clone)]
pub struct ApiClient<T = UreqTransport> {
    base_url: String,
    transport: T,
}

impl ApiClient<UreqTransport> {
    /// Client using the blocking ureq transport with the configured timeout.
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new(config.timeout()))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: &ClientConfig, transport: T) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve `url` against the base address. Absolute URLs pass through.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!("{}/{}", self.base_url, url.trim_start_matches('/'))
    }

    /// Build the request for a call without executing it.
    ///
    /// A JSON body gets a `content-type` header; caller headers follow in
    /// order.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&B>,
        headers: &[(&str, &str)],
    ) -> Result<HttpRequest, Failure> {
        let mut request_headers = Vec::with_capacity(headers.len() + 1);
        let body = match body {
            Some(body) => {
                let encoded = serde_json::to_string(body).map_err(|e| Failure::Unclassified {
                    status: None,
                    reason: format!("request body could not be encoded: {e}"),
                })?;
                request_headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(encoded)
            }
            None => None,
        };
        request_headers.extend(
            headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string())),
        );
        Ok(HttpRequest {
            method,
            url: self.resolve(url),
            headers: request_headers,
            body,
        })
    }

    pub fn get(&self, url: &str) -> Result<HttpResponse, NormalizedError> {
        self.dispatch::<()>(HttpMethod::Get, url, None, &[])
    }

    pub fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, NormalizedError> {
        self.dispatch(HttpMethod::Post, url, Some(body), headers)
    }

    pub fn put<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, NormalizedError> {
        self.dispatch(HttpMethod::Put, url, Some(body), headers)
    }

    pub fn delete(&self, url: &str) -> Result<HttpResponse, NormalizedError> {
        self.dispatch::<()>(HttpMethod::Delete, url, None, &[])
    }

    fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&B>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, NormalizedError> {
        let outcome = self
            .build_request(method, url, body, headers)
            .and_then(|request| {
                tracing::debug!(%method, url = %request.url, "dispatching request");
                self.transport.execute(&request)
            })
            .and_then(check_status);

        match outcome {
            Ok(response) => {
                tracing::debug!(%method, status = response.status, "request succeeded");
                Ok(response)
            }
            Err(failure) => {
                let normalized = normalize(&failure);
                tracing::warn!(
                    %method,
                    url,
                    kind = failure.kind(),
                    status = normalized.status,
                    ?failure,
                    "request failed"
                );
                Err(normalized)
            }
        }
    }
}

/// 2xx responses pass through untouched; everything else is classified.
fn check_status(response: HttpResponse) -> Result<HttpResponse, Failure> {
    if response.is_success() {
        return Ok(response);
    }
    Err(Failure::from_status(response.status, &response.body))
}
