//! Failure classification and the normalized error returned to callers.
//!
//! # Design
//! A failed call is first described as a `Failure`, one variant per coarse
//! classification, each carrying what that classification can know (the HTTP
//! status and the server body for 4xx/5xx, a reason for everything else).
//! `normalize` is a single exhaustive match from `Failure` to
//! `NormalizedError`, so every failure produces exactly one fully populated
//! `{message, status}` value.

use serde_json::Value;
use thiserror::Error;

/// Status reported when the failure carries no usable status of its own.
pub const SENTINEL_STATUS: u16 = 501;

pub const NETWORK_MESSAGE: &str = "Please check internet connectivity, then retry!";
pub const SERVER_CODE_MESSAGE: &str = "Please contact support, issue in server";
pub const SERVER_GENERIC_MESSAGE: &str = "Please contact support, something wrong with server";
pub const REQUEST_GENERIC_MESSAGE: &str = "Oops, Something went wrong!";
pub const UNCLASSIFIED_MESSAGE: &str = "Request could not be completed, please retry!";

/// The uniform error value produced for any failed outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NormalizedError {
    pub message: String,
    pub status: u16,
}

impl NormalizedError {
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }
}

/// Shape of the body a server sent along with a 4xx/5xx status.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Empty,
    Json(Value),
    Text(String),
}

impl ErrorBody {
    /// Interpret a raw response body. JSON is preferred; anything else that is
    /// not blank is kept as text.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return ErrorBody::Empty;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => ErrorBody::Json(value),
            Err(_) => ErrorBody::Text(raw.to_string()),
        }
    }

    /// Field of a JSON object body, if present and truthy.
    fn field(&self, name: &str) -> Option<&Value> {
        match self {
            ErrorBody::Json(Value::Object(map)) => map.get(name).filter(|v| truthy(v)),
            _ => None,
        }
    }

    /// The body itself when it is plain, non-empty text. A top-level JSON
    /// string counts as text.
    fn as_text(&self) -> Option<&str> {
        match self {
            ErrorBody::Text(text) => Some(text.as_str()),
            ErrorBody::Json(Value::String(text)) if !text.is_empty() => Some(text.as_str()),
            _ => None,
        }
    }

    /// The `status` field of the body, accepted as a number or numeric string.
    fn status(&self) -> Option<u16> {
        match self.field("status")? {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Coarse classification of a failed call.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// No response was reachable.
    Network { reason: String },
    /// The server answered with a 5xx status.
    BadResponse { status: u16, body: ErrorBody },
    /// The server answered with a 4xx status.
    BadRequest { status: u16, body: ErrorBody },
    /// Anything else: timeouts, unexpected statuses, unencodable requests,
    /// unreadable responses.
    Unclassified { status: Option<u16>, reason: String },
}

impl Failure {
    /// Classify a non-2xx response by its status code.
    pub fn from_status(status: u16, raw_body: &str) -> Self {
        match status {
            400..=499 => Failure::BadRequest {
                status,
                body: ErrorBody::parse(raw_body),
            },
            500..=599 => Failure::BadResponse {
                status,
                body: ErrorBody::parse(raw_body),
            },
            _ => Failure::Unclassified {
                status: Some(status),
                reason: format!("unexpected status {status}"),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Failure::Network { .. } => "network",
            Failure::BadResponse { .. } => "bad_response",
            Failure::BadRequest { .. } => "bad_request",
            Failure::Unclassified { .. } => "unclassified",
        }
    }
}

impl From<Failure> for NormalizedError {
    fn from(failure: Failure) -> Self {
        normalize(&failure)
    }
}

/// Turn a classified failure into the uniform `{message, status}` value.
pub fn normalize(failure: &Failure) -> NormalizedError {
    match failure {
        Failure::Network { .. } => NormalizedError::new(NETWORK_MESSAGE, SENTINEL_STATUS),
        Failure::BadResponse { status, body } => {
            if body.field("code").is_some() {
                NormalizedError::new(SERVER_CODE_MESSAGE, SENTINEL_STATUS)
            } else if let Some(message) = body.field("message") {
                NormalizedError::new(stringify(message), body.status().unwrap_or(*status))
            } else {
                NormalizedError::new(SERVER_GENERIC_MESSAGE, SENTINEL_STATUS)
            }
        }
        Failure::BadRequest { status, body } => {
            if let Some(message) = body.field("message") {
                NormalizedError::new(stringify(message), body.status().unwrap_or(*status))
            } else if let Some(text) = body.as_text() {
                NormalizedError::new(text, *status)
            } else {
                NormalizedError::new(REQUEST_GENERIC_MESSAGE, *status)
            }
        }
        Failure::Unclassified { status, .. } => {
            NormalizedError::new(UNCLASSIFIED_MESSAGE, status.unwrap_or(SENTINEL_STATUS))
        }
    }
}

/// Text values pass through; anything structured is serialized to JSON text.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Loose JSON truthiness: null, false, zero and "" count as absent.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Errors raised while building a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("base url must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),

    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}
