//! Payload and result types for the prediction API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::http::HttpResponse;

pub const DEFAULT_PROMPT_STRENGTH: f64 = 0.7;
pub const DEFAULT_GUIDANCE_SCALE: f64 = 15.0;
pub const DEFAULT_INFERENCE_STEPS: u32 = 50;

/// An image in a form the provider accepts: a data URI or a hosted URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    /// Encode raw image bytes as `data:<mime>;base64,<payload>`.
    pub fn encode(mime: &mime::Mime, bytes: &[u8]) -> Self {
        Self(format!(
            "data:{};base64,{}",
            mime.essence_str(),
            STANDARD.encode(bytes)
        ))
    }

    /// Reference an image that is already hosted somewhere.
    pub fn url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }
}

/// Body of `POST predictions`.
///
/// `new` fills the form's starting values. Nothing here is checked on send;
/// call `validate` to enforce the documented ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GenerateImageRequest {
    #[validate(custom = "validate_image")]
    pub image: ImageData,
    #[validate(length(min = 1, message = "prompt is required"))]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0, message = "prompt_strength must be between 0 and 1"))]
    pub prompt_strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1.0, max = 50.0, message = "guidance_scale must be between 1 and 50"))]
    pub guidance_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 500, message = "num_inference_steps must be between 1 and 500"))]
    pub num_inference_steps: Option<u32>,
}

impl GenerateImageRequest {
    pub fn new(image: ImageData, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
            negative_prompt: None,
            prompt_strength: Some(DEFAULT_PROMPT_STRENGTH),
            guidance_scale: Some(DEFAULT_GUIDANCE_SCALE),
            num_inference_steps: Some(DEFAULT_INFERENCE_STEPS),
        }
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    pub fn with_prompt_strength(mut self, prompt_strength: f64) -> Self {
        self.prompt_strength = Some(prompt_strength);
        self
    }

    pub fn with_guidance_scale(mut self, guidance_scale: f64) -> Self {
        self.guidance_scale = Some(guidance_scale);
        self
    }

    pub fn with_inference_steps(mut self, steps: u32) -> Self {
        self.num_inference_steps = Some(steps);
        self
    }
}

fn validate_image(image: &ImageData) -> Result<(), validator::ValidationError> {
    if image.as_str().trim().is_empty() {
        let mut err = validator::ValidationError::new("required");
        err.message = Some("image is required".into());
        return Err(err);
    }
    Ok(())
}

/// A prediction as returned by the provider.
///
/// Only the fields the form reads are typed; the rest of the body stays in the
/// raw response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Value,
}

impl Prediction {
    pub fn from_response(response: &HttpResponse) -> Result<Self, serde_json::Error> {
        response.json()
    }

    /// The generated image reference: `output` itself when it is text, or the
    /// first text entry when it is a list.
    pub fn output(&self) -> Option<&str> {
        match &self.output {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) => items.iter().find_map(Value::as_str),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GenerateImageRequest {
        GenerateImageRequest::new(ImageData::url("https://i.example.com/cat.png"), "a cat")
    }

    #[test]
    fn new_uses_form_defaults() {
        let req = sample();
        assert_eq!(req.prompt_strength, Some(0.7));
        assert_eq!(req.guidance_scale, Some(15.0));
        assert_eq!(req.num_inference_steps, Some(50));
        assert!(req.negative_prompt.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let req = sample().with_negative_prompt("blurry");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["image"], "https://i.example.com/cat.png");
        assert_eq!(json["prompt"], "a cat");
        assert_eq!(json["negative_prompt"], "blurry");
        assert_eq!(json["prompt_strength"], 0.7);
        assert_eq!(json["guidance_scale"], 15.0);
        assert_eq!(json["num_inference_steps"], 50);
    }

    #[test]
    fn unset_optionals_are_omitted() {
        let mut req = sample();
        req.prompt_strength = None;
        req.guidance_scale = None;
        req.num_inference_steps = None;
        let json = serde_json::to_value(&req).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(json.get("negative_prompt").is_none());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let errors = sample()
            .with_prompt_strength(1.5)
            .with_guidance_scale(0.5)
            .with_inference_steps(0)
            .validate()
            .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("prompt_strength"));
        assert!(fields.contains_key("guidance_scale"));
        assert!(fields.contains_key("num_inference_steps"));
    }

    #[test]
    fn validate_accepts_range_bounds() {
        let req = sample()
            .with_prompt_strength(0.0)
            .with_guidance_scale(50.0)
            .with_inference_steps(500);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validate_requires_prompt_and_image() {
        let req = GenerateImageRequest::new(ImageData::url(""), "");
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("prompt"));
        assert!(fields.contains_key("image"));
    }

    #[test]
    fn encode_builds_data_uri() {
        let image = ImageData::encode(&mime::IMAGE_PNG, &[0x89, b'P', b'N', b'G']);
        assert_eq!(image.as_str(), "data:image/png;base64,iVBORw==");
        assert!(image.is_data_uri());
        assert!(!ImageData::url("https://x/y.png").is_data_uri());
    }

    #[test]
    fn prediction_output_accepts_string_or_list() {
        let single: Prediction =
            serde_json::from_str(r#"{"id":"p1","status":"succeeded","output":"https://o/1.png"}"#)
                .unwrap();
        assert_eq!(single.output(), Some("https://o/1.png"));
        assert_eq!(single.id.as_deref(), Some("p1"));

        let list: Prediction =
            serde_json::from_str(r#"{"output":["https://o/2.png","https://o/3.png"]}"#).unwrap();
        assert_eq!(list.output(), Some("https://o/2.png"));

        let pending: Prediction = serde_json::from_str(r#"{"status":"starting"}"#).unwrap();
        assert_eq!(pending.output(), None);
    }
}
