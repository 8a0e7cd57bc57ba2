//! Execution of `HttpRequest` values against the network.
//!
//! # Design
//! `Transport` is the seam between the pure request/response types and real
//! I/O. Implementations return every response that arrived, whatever its
//! status, and report only failures where no response could be read. Status
//! interpretation belongs to `ApiClient`.

use std::io::ErrorKind;
use std::time::Duration;

use crate::error::Failure;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Upper bound on a response body. Results carry images as data URIs, which
/// outgrow ureq's default limit.
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Executes a request and returns the raw response.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Failure>;
}

/// Blocking transport backed by a ureq agent with one global timeout.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Failure> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Delete => {
                let mut builder = self.agent.delete(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post | HttpMethod::Put => {
                let mut builder = if request.method == HttpMethod::Post {
                    self.agent.post(&request.url)
                } else {
                    self.agent.put(&request.url)
                };
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(classify_transport_error)?;

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
        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| Failure::Unclassified {
                status: Some(status),
                reason: format!("unreadable response body: {e}"),
            })?;
        let body = decode_body(status, bytes);

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Decode a response body as text. Successful bodies that are not UTF-8 are
/// decoded lossily; error bodies that are not UTF-8 carry no readable shape
/// and come back empty.
fn decode_body(status: u16, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) if (200..300).contains(&status) => {
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
        Err(_) => String::new(),
    }
}

/// Map a ureq error (no response available) onto a failure classification.
fn classify_transport_error(err: ureq::Error) -> Failure {
    match err {
        ureq::Error::Timeout(_) => Failure::Unclassified {
            status: None,
            reason: format!("timed out: {err}"),
        },
        ureq::Error::Io(ref io) if io.kind() == ErrorKind::TimedOut => Failure::Unclassified {
            status: None,
            reason: format!("timed out: {err}"),
        },
        ureq::Error::Io(_) | ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
            Failure::Network {
                reason: err.to_string(),
            }
        }
        other => Failure::Unclassified {
            status: None,
            reason: other.to_string(),
        },
    }
}
