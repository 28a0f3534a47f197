pub mod mock;
pub mod yolov8;

use anyhow::Result;
use async_trait::async_trait;
use common::recognition::Detection;
use image::DynamicImage;

/// Capability the recognition pipeline consumes twice: once to locate
/// plates in the full image and once to locate characters in a plate crop.
///
/// Box coordinates in the returned detections are always relative to the
/// exact pixel buffer passed in. Implementations must not require the
/// caller to mutate a detection after it is returned.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Short identifier used in logs and metrics (e.g. "plate", "character").
    fn id(&self) -> &str;

    /// Run detection on an image or crop, keeping only detections at or
    /// above the given confidence threshold.
    async fn detect(
        &self,
        image: &DynamicImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>>;

    /// Verify the detector is operational.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
