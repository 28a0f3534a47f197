use std::sync::Arc;

use anyhow::Result;
use lpr_service::{
    api,
    config::LprServiceConfig,
    detector::yolov8::{YoloV8Config, YoloV8Detector},
    recognition::{PipelineConfig, RecognitionPipeline},
    state::LprServiceState,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_with_service("lpr-service");

    info!("Starting LPR service...");

    let config = LprServiceConfig::from_env()?;
    info!(
        "LPR service configuration: bind={}, plate_model={}, char_model={}",
        config.bind_addr, config.plate_model_path, config.char_model_path
    );

    let plate_detector = YoloV8Detector::load(
        "plate",
        YoloV8Config::for_model(&config.plate_model_path),
    )?;
    let char_detector = YoloV8Detector::load(
        "character",
        YoloV8Config::for_model(&config.char_model_path),
    )?;

    let pipeline = RecognitionPipeline::new(
        Arc::new(plate_detector),
        Arc::new(char_detector),
        PipelineConfig {
            plate_confidence_threshold: config.plate_confidence_threshold,
            char_confidence_threshold: config.char_confidence_threshold,
        },
    );

    let state = LprServiceState::new(pipeline, "yolov8-dual-stage");
    let app = api::router(state, &config.allowed_origins);

    info!("Binding to {}", config.bind_addr);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("LPR service listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
