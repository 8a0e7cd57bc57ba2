//! The "generate image" domain operation and its companion prediction calls.

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{normalize, Failure, NormalizedError};
use crate::http::HttpResponse;
use crate::transport::{Transport, UreqTransport};
use crate::types::GenerateImageRequest;

/// Resource path all prediction calls live under.
pub const PREDICTIONS_PATH: &str = "predictions";

#[derive(Debug, Clone)]
pub struct ImageGeneration<T = UreqTransport> {
    client: ApiClient<T>,
}

impl ImageGeneration<UreqTransport> {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: ApiClient::new(config),
        }
    }
}

impl<T: Transport> ImageGeneration<T> {
    pub fn with_client(client: ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    /// Submit one generation request. The payload is sent as-is; the raw
    /// provider response comes back on success.
    pub fn generate_image(
        &self,
        payload: &GenerateImageRequest,
    ) -> Result<HttpResponse, NormalizedError> {
        tracing::info!(prompt_len = payload.prompt.len(), "submitting image generation");
        self.client.post(PREDICTIONS_PATH, payload, &[])
    }

    pub fn get_prediction(&self, id: &str) -> Result<HttpResponse, NormalizedError> {
        self.client.get(&prediction_path(id)?)
    }

    pub fn cancel_prediction(&self, id: &str) -> Result<HttpResponse, NormalizedError> {
        self.client.delete(&prediction_path(id)?)
    }
}

/// `predictions/{id}`. Ids are restricted to ASCII alphanumerics, `-` and `_`
/// so an id can never leave its path segment.
fn prediction_path(id: &str) -> Result<String, NormalizedError> {
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !valid {
        let failure = Failure::Unclassified {
            status: None,
            reason: format!("invalid prediction id {id:?}"),
        };
        tracing::warn!(id, "rejected prediction id");
        return Err(normalize(&failure));
    }
    Ok(format!("{PREDICTIONS_PATH}/{id}"))
}
