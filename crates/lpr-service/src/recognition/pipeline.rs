use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use common::recognition::{RecognitionResult, RecognitionStatus};
use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::detector::Detector;

use super::{assembler, geometry, RecognitionError};

/// Confidence thresholds for the two detection stages.
///
/// These are deployment calibration, not pipeline logic; installations
/// tune the two stages independently.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub plate_confidence_threshold: f32,
    pub char_confidence_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            plate_confidence_threshold: 0.5,
            char_confidence_threshold: 0.25,
        }
    }
}

/// Two-stage recognition pipeline: plate detection on the full image,
/// then character detection on each plate crop.
///
/// Detectors are injected at construction and held for the lifetime of
/// the pipeline; there is no global model state.
pub struct RecognitionPipeline {
    plate_detector: Arc<dyn Detector>,
    char_detector: Arc<dyn Detector>,
    config: PipelineConfig,
}

impl RecognitionPipeline {
    pub fn new(
        plate_detector: Arc<dyn Detector>,
        char_detector: Arc<dyn Detector>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            plate_detector,
            char_detector,
            config,
        }
    }

    /// Recognize all plates in one image.
    ///
    /// Plates are reported in the plate detector's emission order. The
    /// elapsed time covers both detection stages and assembly; image
    /// decoding happens in the transport layer before this is called.
    /// Only a detector failure aborts the invocation; degraded plates
    /// (empty crops, unreadable characters) are reported, not dropped.
    pub async fn recognize(
        &self,
        image: &DynamicImage,
    ) -> Result<RecognitionResult, RecognitionError> {
        let start = Instant::now();
        let (width, height) = (image.width(), image.height());

        let plate_detections = self
            .plate_detector
            .detect(image, self.config.plate_confidence_threshold)
            .await
            .map_err(RecognitionError::Detector)?;

        if plate_detections.is_empty() {
            debug!(width, height, "no plates found");
            return Ok(RecognitionResult {
                status: RecognitionStatus::NoPlatesFound,
                plates: Vec::new(),
                elapsed: start.elapsed(),
            });
        }

        let mut plates = Vec::with_capacity(plate_detections.len());
        for plate in &plate_detections {
            let clamped = geometry::clamp(&plate.bbox, width, height);
            let char_detections = if clamped.is_empty() {
                warn!(
                    plate_box = ?plate.bbox,
                    "plate crop is empty, skipping character detection"
                );
                Vec::new()
            } else {
                let crop = geometry::crop(image, &clamped);
                self.char_detector
                    .detect(&crop, self.config.char_confidence_threshold)
                    .await
                    .map_err(RecognitionError::Detector)?
            };

            let result = assembler::assemble(plate, char_detections, width, height);
            telemetry::metrics::LPR_CHARACTERS_DETECTED
                .inc_by(result.character_detections.len() as u64);
            plates.push(result);
        }

        telemetry::metrics::LPR_PLATES_DETECTED.inc_by(plates.len() as u64);
        info!(
            plates = plates.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "recognition complete"
        );

        Ok(RecognitionResult {
            status: RecognitionStatus::Success,
            plates,
            elapsed: start.elapsed(),
        })
    }

    /// Verify both detector stages are operational.
    pub async fn health_check(&self) -> Result<bool> {
        let plate_ok = self.plate_detector.health_check().await?;
        let char_ok = self.char_detector.health_check().await?;
        Ok(plate_ok && char_ok)
    }
}
