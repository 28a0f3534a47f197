use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use common::recognition::{RecognitionStatus, RecognizeRequest, RecognizeResponse};
use prometheus::{Encoder, TextEncoder};
use tracing::{error, instrument};

use crate::state::LprServiceState;

use super::ApiError;

/// POST /v1/recognize
///
/// Accepts a base64-encoded image and returns every plate found in it.
/// Zero plates is a distinct outcome, not an error in the log sense,
/// but it maps to 404 so callers can branch without parsing the body.
#[instrument(skip(state, request))]
pub async fn recognize(
    State(state): State<LprServiceState>,
    Json(request): Json<RecognizeRequest>,
) -> Result<Response, ApiError> {
    let image_bytes = base64::engine::general_purpose::STANDARD
        .decode(&request.data)
        .map_err(|e| ApiError::bad_request(format!("invalid base64 image data: {}", e)))?;

    let image = image::load_from_memory(&image_bytes)
        .map_err(|e| ApiError::bad_request(format!("failed to decode image: {}", e)))?;

    let result = state.pipeline().recognize(&image).await.map_err(|e| {
        error!(error = %e, "recognition failed");
        telemetry::metrics::LPR_RECOGNITIONS
            .with_label_values(&["error"])
            .inc();
        ApiError::from(e)
    })?;

    let status = match result.status {
        RecognitionStatus::Success => {
            telemetry::metrics::LPR_RECOGNITIONS
                .with_label_values(&["success"])
                .inc();
            StatusCode::OK
        }
        RecognitionStatus::NoPlatesFound => {
            telemetry::metrics::LPR_RECOGNITIONS
                .with_label_values(&["no_plates_found"])
                .inc();
            StatusCode::NOT_FOUND
        }
    };

    let body = RecognizeResponse::from_result(result, state.model_used());
    Ok((status, Json(body)).into_response())
}

/// GET /healthz — process liveness.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// GET /readyz — both detector stages must respond.
pub async fn readyz(State(state): State<LprServiceState>) -> StatusCode {
    match state.pipeline().health_check().await {
        Ok(true) => StatusCode::OK,
        Ok(false) => StatusCode::SERVICE_UNAVAILABLE,
        Err(e) => {
            error!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /metrics — Prometheus exposition.
pub async fn metrics() -> Result<String, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = telemetry::metrics::REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::internal(format!("failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ApiError::internal(format!("metrics are not valid UTF-8: {}", e)))
}
