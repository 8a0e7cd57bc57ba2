//! Client core for a remote image generation service.
//!
//! # Overview
//! Submits generation requests (`POST {base}/predictions`) and hands back
//! either the provider's raw response or a `NormalizedError`, a uniform
//! `{message, status}` value built from whatever shape the failure took.
//!
//! # Design
//! - `ClientConfig` fixes the base address and timeout at construction.
//! - `ApiClient` builds requests as plain data (`HttpRequest`) and runs them
//!   through a `Transport`; `UreqTransport` is the blocking network
//!   implementation.
//! - Failures are classified into `Failure` and normalized by one exhaustive
//!   match in `error::normalize`; no error escapes the client unnormalized.
//! - `ImageGeneration` is the domain operation on top of `ApiClient`.

pub mod client;
pub mod config;
pub mod error;
pub mod generation;
pub mod http;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{normalize, ConfigError, ErrorBody, Failure, NormalizedError};
pub use generation::ImageGeneration;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{GenerateImageRequest, ImageData, Prediction};
