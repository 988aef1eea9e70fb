//! HTTP handlers.
//!
//! Every handler reads the shared [`AppState`]; none of them mutate it. Bodies
//! are parsed as untyped JSON first so that a missing or mistyped field is
//! reported as a 400 with a JSON `error` message before any inference runs.

use super::error::ApiError;
use super::AppState;
use crate::core::SentimentError;
use crate::pipelines::Sentiment;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Number of feature names reported by `/model-info`.
pub const MODEL_INFO_FEATURES: usize = 20;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub text: String,
    pub sentiment: Sentiment,
    pub confidence: f32,
    pub model_version: String,
}

#[derive(Debug, Serialize)]
pub struct BatchItem {
    pub text: String,
    pub sentiment: Sentiment,
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
pub struct BatchPredictResponse {
    pub predictions: Vec<BatchItem>,
    pub count: usize,
    pub model_version: String,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub model_type: String,
    pub version: String,
    pub features: Vec<String>,
    pub status: String,
}

fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ApiError::Validation(format!("Invalid JSON body: {e}")))
}

fn required_field<'a>(body: &'a Value, field: &str) -> Result<&'a Value, ApiError> {
    body.as_object()
        .and_then(|obj| obj.get(field))
        .ok_or_else(|| ApiError::Validation(format!("Missing '{field}' field")))
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Readiness probe: 503 until the model store is loaded.
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.store.is_ready() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready", "reason": "model not loaded" })),
        )
    }
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let body = parse_body(&body)?;
    let text = required_field(&body, "text")?
        .as_str()
        .ok_or_else(|| ApiError::Validation("'text' must be a string".into()))?
        .to_string();

    let prediction = state
        .store
        .transform_and_predict(std::slice::from_ref(&text))?
        .pop()
        .ok_or_else(|| SentimentError::Inference("no prediction produced".into()))?;

    tracing::debug!(sentiment = %prediction.sentiment, confidence = prediction.confidence, "predicted");

    Ok(Json(PredictResponse {
        text,
        sentiment: prediction.sentiment,
        confidence: prediction.confidence,
        model_version: state.model_version.clone(),
    }))
}

pub async fn batch_predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<BatchPredictResponse>, ApiError> {
    let body = parse_body(&body)?;
    let texts = required_field(&body, "texts")?
        .as_array()
        .ok_or_else(|| ApiError::Validation("'texts' must be a list".into()))?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Vec<String>>>()
        .ok_or_else(|| ApiError::Validation("'texts' must be a list of strings".into()))?;

    let predictions = state.store.transform_and_predict(&texts)?;
    tracing::debug!(count = predictions.len(), "batch predicted");

    let predictions: Vec<BatchItem> = texts
        .into_iter()
        .zip(predictions)
        .map(|(text, p)| BatchItem {
            text,
            sentiment: p.sentiment,
            confidence: p.confidence,
        })
        .collect();

    Ok(Json(BatchPredictResponse {
        count: predictions.len(),
        predictions,
        model_version: state.model_version.clone(),
    }))
}

pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfoResponse> {
    let status = if state.store.is_ready() {
        "loaded"
    } else {
        "not loaded"
    };
    Json(ModelInfoResponse {
        model_type: state.store.model_type().to_string(),
        version: state.model_version.clone(),
        features: state.store.feature_sample(MODEL_INFO_FEATURES),
        status: status.to_string(),
    })
}

/// Prometheus text exposition of the request counters.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_treats_blank_as_null() {
        assert_eq!(parse_body(&Bytes::from_static(b"  \n")).unwrap(), Value::Null);
        assert!(matches!(
            parse_body(&Bytes::from_static(b"{not json")),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_required_field_needs_an_object() {
        let err = required_field(&json!(["text"]), "text").unwrap_err();
        assert_eq!(err.to_string(), "Missing 'text' field");
        assert!(required_field(&json!({ "text": 1 }), "text").is_ok());
    }
}
