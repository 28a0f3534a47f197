/// Canned-response detector for testing and offline demonstration
use super::Detector;
use anyhow::{bail, Result};
use async_trait::async_trait;
use common::recognition::Detection;
use image::DynamicImage;

/// Detector that replays a fixed set of detections on every call.
///
/// Deterministic by construction: the same input always yields the same
/// output, which lets pipeline tests assert byte-identical results.
pub struct MockDetector {
    id: String,
    detections: Vec<Detection>,
    fail: bool,
}

impl MockDetector {
    /// Detector that returns the given detections, filtered by the
    /// threshold passed to `detect`.
    pub fn returning(id: impl Into<String>, detections: Vec<Detection>) -> Self {
        Self {
            id: id.into(),
            detections,
            fail: false,
        }
    }

    /// Detector that finds nothing.
    pub fn empty(id: impl Into<String>) -> Self {
        Self::returning(id, Vec::new())
    }

    /// Detector whose every invocation fails.
    pub fn failing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            detections: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl Detector for MockDetector {
    fn id(&self) -> &str {
        &self.id
    }

    async fn detect(
        &self,
        _image: &DynamicImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>> {
        if self.fail {
            bail!("mock detector '{}' configured to fail", self.id);
        }

        Ok(self
            .detections
            .iter()
            .copied()
            .filter(|d| d.confidence >= confidence_threshold)
            .collect())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::recognition::Rect;
    use image::RgbImage;

    fn detection(confidence: f32) -> Detection {
        Detection::new(Rect::new(0, 0, 10, 10).unwrap(), 0, confidence).unwrap()
    }

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(64, 64))
    }

    #[tokio::test]
    async fn test_mock_detector_filters_by_threshold() {
        let detector =
            MockDetector::returning("plate", vec![detection(0.9), detection(0.4), detection(0.6)]);

        let found = detector.detect(&test_image(), 0.5).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|d| d.confidence >= 0.5));
    }

    #[tokio::test]
    async fn test_mock_detector_deterministic() {
        let detector = MockDetector::returning("plate", vec![detection(0.9), detection(0.8)]);

        let first = detector.detect(&test_image(), 0.5).await.unwrap();
        let second = detector.detect(&test_image(), 0.5).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_mock_detector_failure() {
        let detector = MockDetector::failing("plate");

        assert!(detector.detect(&test_image(), 0.5).await.is_err());
        assert!(!detector.health_check().await.unwrap());
    }
}
