use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// How long `/faults/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub status: String,
    pub input: CreatePrediction,
    pub output: Option<String>,
}

/// Generation input. Every field is optional here so missing fields produce
/// the provider's own error bodies instead of an extractor rejection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreatePrediction {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub prompt_strength: Option<f64>,
    #[serde(default)]
    pub guidance_scale: Option<f64>,
    #[serde(default)]
    pub num_inference_steps: Option<u32>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Prediction>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/predictions", get(list_predictions).post(create_prediction))
        .route(
            "/predictions/{id}",
            get(get_prediction).delete(cancel_prediction),
        )
        .route("/faults/server-code", get(fault_server_code))
        .route("/faults/server-message", get(fault_server_message))
        .route("/faults/server-empty", get(fault_server_empty))
        .route("/faults/plain-text", get(fault_plain_text))
        .route("/faults/slow", get(fault_slow))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// JSON error body in the provider's `{message, status}` shape.
fn error_body(status: StatusCode, message: Value) -> Response {
    (
        status,
        Json(json!({ "message": message, "status": status.as_u16() })),
    )
        .into_response()
}

async fn list_predictions(State(db): State<Db>) -> Json<Vec<Prediction>> {
    let predictions = db.read().await;
    Json(predictions.values().cloned().collect())
}

async fn create_prediction(State(db): State<Db>, Json(input): Json<CreatePrediction>) -> Response {
    let prompt = input.prompt.as_deref().map(str::trim).unwrap_or_default();
    if prompt.is_empty() {
        tracing::info!("rejecting prediction without prompt");
        return error_body(StatusCode::BAD_REQUEST, json!("prompt is required"));
    }
    let image = match input.image.as_deref().map(str::trim) {
        Some(image) if !image.is_empty() => image.to_string(),
        _ => {
            tracing::info!("rejecting prediction without image");
            return error_body(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "image": ["is required"] }),
            );
        }
    };
    if let Some(strength) = input.prompt_strength {
        if !(0.0..=1.0).contains(&strength) {
            return (
                StatusCode::BAD_REQUEST,
                "prompt_strength must be between 0 and 1",
            )
                .into_response();
        }
    }

    let prediction = Prediction {
        id: Uuid::new_v4(),
        status: "succeeded".to_string(),
        input,
        output: Some(image),
    };
    tracing::info!(id = %prediction.id, "prediction created");
    db.write().await.insert(prediction.id, prediction.clone());
    (StatusCode::CREATED, Json(prediction)).into_response()
}

async fn get_prediction(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    let predictions = db.read().await;
    match predictions.get(&id) {
        Some(prediction) => Json(prediction.clone()).into_response(),
        None => error_body(StatusCode::NOT_FOUND, json!("prediction not found")),
    }
}

async fn cancel_prediction(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    let mut predictions = db.write().await;
    match predictions.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error_body(StatusCode::NOT_FOUND, json!("prediction not found")),
    }
}

async fn fault_server_code() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "code": "E_INTERNAL" })),
    )
        .into_response()
}

async fn fault_server_message() -> Response {
    error_body(StatusCode::SERVICE_UNAVAILABLE, json!("model is warming up"))
}

async fn fault_server_empty() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn fault_plain_text() -> Response {
    (StatusCode::NOT_FOUND, "no such model").into_response()
}

async fn fault_slow() -> Json<Value> {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(json!({ "status": "succeeded" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_serializes_to_json() {
        let prediction = Prediction {
            id: Uuid::nil(),
            status: "succeeded".to_string(),
            input: CreatePrediction {
                prompt: Some("a cat".to_string()),
                ..CreatePrediction::default()
            },
            output: Some("data:image/png;base64,AA==".to_string()),
        };
        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["status"], "succeeded");
        assert_eq!(json["input"]["prompt"], "a cat");
        assert_eq!(json["output"], "data:image/png;base64,AA==");
    }

    #[test]
    fn create_prediction_accepts_empty_object() {
        let input: CreatePrediction = serde_json::from_str("{}").unwrap();
        assert!(input.prompt.is_none());
        assert!(input.image.is_none());
    }

    #[test]
    fn create_prediction_reads_all_fields() {
        let input: CreatePrediction = serde_json::from_str(
            r#"{"image":"data:x","prompt":"p","negative_prompt":"n",
                "prompt_strength":0.7,"guidance_scale":15,"num_inference_steps":50}"#,
        )
        .unwrap();
        assert_eq!(input.prompt.as_deref(), Some("p"));
        assert_eq!(input.guidance_scale, Some(15.0));
        assert_eq!(input.num_inference_steps, Some(50));
    }
}
