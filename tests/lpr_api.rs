/// Integration tests for the LPR HTTP API
use std::io::Cursor;
use std::sync::Arc;

use base64::Engine;
use common::recognition::{Detection, RecognizeResponse, Rect};
use image::{DynamicImage, ImageFormat, RgbImage};
use lpr_service::api;
use lpr_service::detector::mock::MockDetector;
use lpr_service::recognition::{PipelineConfig, RecognitionPipeline};
use lpr_service::state::LprServiceState;

fn rect(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Rect {
    Rect::new(x_min, y_min, x_max, y_max).unwrap()
}

fn detection(bbox: Rect, class_id: u32, confidence: f32) -> Detection {
    Detection::new(bbox, class_id, confidence).unwrap()
}

fn setup_test_service(plate: MockDetector, chars: MockDetector) -> axum::Router {
    let pipeline = RecognitionPipeline::new(
        Arc::new(plate),
        Arc::new(chars),
        PipelineConfig::default(),
    );
    let state = LprServiceState::new(pipeline, "yolov8-dual-stage");
    api::router(state, &["http://localhost:3000".to_string()])
}

fn encoded_test_image() -> String {
    let image = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[tokio::test]
async fn test_healthz() {
    let app = setup_test_service(MockDetector::empty("plate"), MockDetector::empty("character"));

    let response = axum_test::TestServer::new(app)
        .unwrap()
        .get("/healthz")
        .await;

    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_readyz_degraded_detector() {
    let app = setup_test_service(MockDetector::empty("plate"), MockDetector::failing("character"));

    let response = axum_test::TestServer::new(app).unwrap().get("/readyz").await;

    assert_eq!(response.status_code(), 503);
}

#[tokio::test]
async fn test_recognize_success() {
    let plate = MockDetector::returning(
        "plate",
        vec![detection(rect(50, 100, 450, 250), 0, 0.92)],
    );
    let chars = MockDetector::returning(
        "character",
        vec![
            detection(rect(65, 10, 105, 100), 1, 0.85),
            detection(rect(10, 10, 50, 100), 11, 0.88),
            detection(rect(120, 10, 160, 100), 2, 0.81),
        ],
    );
    let app = setup_test_service(plate, chars);

    let response = axum_test::TestServer::new(app)
        .unwrap()
        .post("/v1/recognize")
        .json(&serde_json::json!({ "data": encoded_test_image() }))
        .await;

    assert_eq!(response.status_code(), 200);

    let body: RecognizeResponse = response.json();
    assert_eq!(body.plates.len(), 1);
    assert_eq!(body.plates[0].plate_text, "B12");
    assert_eq!(body.model_used, "yolov8-dual-stage");
    assert!(body.time_taken_ms >= 0.0);
}

#[tokio::test]
async fn test_recognize_no_plates_found_is_404() {
    let app = setup_test_service(MockDetector::empty("plate"), MockDetector::empty("character"));

    let response = axum_test::TestServer::new(app)
        .unwrap()
        .post("/v1/recognize")
        .json(&serde_json::json!({ "data": encoded_test_image() }))
        .await;

    assert_eq!(response.status_code(), 404);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "no_plates_found");
    assert_eq!(body["plates"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_recognize_invalid_base64_is_400() {
    let app = setup_test_service(MockDetector::empty("plate"), MockDetector::empty("character"));

    let response = axum_test::TestServer::new(app)
        .unwrap()
        .post("/v1/recognize")
        .json(&serde_json::json!({ "data": "not!!valid@@base64" }))
        .await;

    assert_eq!(response.status_code(), 400);

    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("base64"));
}

#[tokio::test]
async fn test_recognize_undecodable_image_is_400() {
    let app = setup_test_service(MockDetector::empty("plate"), MockDetector::empty("character"));

    let not_an_image = base64::engine::general_purpose::STANDARD.encode(b"plain text, no pixels");
    let response = axum_test::TestServer::new(app)
        .unwrap()
        .post("/v1/recognize")
        .json(&serde_json::json!({ "data": not_an_image }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_recognize_detector_failure_is_500() {
    let app = setup_test_service(MockDetector::failing("plate"), MockDetector::empty("character"));

    let response = axum_test::TestServer::new(app)
        .unwrap()
        .post("/v1/recognize")
        .json(&serde_json::json!({ "data": encoded_test_image() }))
        .await;

    assert_eq!(response.status_code(), 500);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup_test_service(MockDetector::empty("plate"), MockDetector::empty("character"));

    // Metrics register on first use; touch one so the exposition is non-empty
    telemetry::metrics::LPR_RECOGNITIONS
        .with_label_values(&["success"])
        .inc();

    let response = axum_test::TestServer::new(app)
        .unwrap()
        .get("/metrics")
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("lpr_"));
}
