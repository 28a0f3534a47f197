//! Recognition contracts for the license plate recognition service.
//!
//! This module defines the detector output model (rectangles and raw
//! detections) and the structured recognition results exchanged over the
//! API. Detections are immutable once returned by a detector.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Raised when a rectangle or detection is built with invalid fields.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidDetection {
    #[error("inverted rectangle: ({x_min},{y_min})-({x_max},{y_max})")]
    InvertedRect {
        x_min: u32,
        y_min: u32,
        x_max: u32,
        y_max: u32,
    },

    #[error("confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f32),
}

/// Axis-aligned rectangle in pixel coordinates.
///
/// Whether the coordinates are relative to the full image or to a plate
/// crop is a property of the surrounding context, not of the rectangle
/// itself; callers must track which space a rectangle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl Rect {
    /// Build a rectangle, rejecting inverted bounds.
    pub fn new(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Result<Self, InvalidDetection> {
        if x_min > x_max || y_min > y_max {
            return Err(InvalidDetection::InvertedRect {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }
        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    /// A rectangle with zero width or height encloses no pixels.
    pub fn is_empty(&self) -> bool {
        self.x_min == self.x_max || self.y_min == self.y_max
    }
}

/// One raw detector output: a box, a class id and a confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box, relative to the pixel buffer the detector was given.
    pub bbox: Rect,

    /// Model class index (meaning depends on the detector).
    pub class_id: u32,

    /// Detection confidence in [0, 1], as reported by the detector.
    pub confidence: f32,
}

impl Detection {
    /// Build a detection, rejecting confidences outside [0, 1].
    pub fn new(bbox: Rect, class_id: u32, confidence: f32) -> Result<Self, InvalidDetection> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(InvalidDetection::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            bbox,
            class_id,
            confidence,
        })
    }
}

/// A character detection after class-id mapping.
///
/// The box is in crop-local coordinates, relative to the plate crop that
/// produced it; downstream consumers overlay these on the cropped plate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterDetection {
    pub bbox: Rect,
    pub character: char,
    pub confidence: f32,
}

/// One recognized plate within an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateResult {
    /// Recognized characters concatenated left to right. Empty when the
    /// plate was detected but no character was legible.
    pub plate_text: String,

    /// Plate bounding box in full-image coordinates, as emitted by the
    /// plate detector.
    pub plate_box: Rect,

    /// Confidence of the plate detection, carried through unmodified.
    pub plate_confidence: f32,

    /// Character detections sorted by ascending left edge, in crop-local
    /// coordinates.
    pub character_detections: Vec<CharacterDetection>,
}

/// Outcome category of one recognition invocation.
///
/// `NoPlatesFound` is a normal outcome, distinct from a processing
/// failure; the transport layer maps it to a "not found" response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionStatus {
    Success,
    NoPlatesFound,
}

/// Top-level output of one pipeline invocation.
///
/// Plates appear in the plate detector's emission order and are never
/// re-sorted; only characters within a plate are ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub status: RecognitionStatus,
    pub plates: Vec<PlateResult>,

    /// Time spent in detection and assembly. Image decoding happens in
    /// the transport layer before the clock starts.
    pub elapsed: Duration,
}

/// Request body for `POST /v1/recognize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeRequest {
    /// Base64-encoded image (JPEG or PNG).
    pub data: String,
}

/// Response body for `POST /v1/recognize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeResponse {
    pub status: RecognitionStatus,
    pub plates: Vec<PlateResult>,
    pub time_taken_ms: f64,
    pub model_used: String,
}

impl RecognizeResponse {
    /// Presentation view of a pipeline result. Durations are rounded to
    /// hundredths of a millisecond here and nowhere earlier.
    pub fn from_result(result: RecognitionResult, model_used: impl Into<String>) -> Self {
        let time_taken_ms = (result.elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0;
        Self {
            status: result.status,
            plates: result.plates,
            time_taken_ms,
            model_used: model_used.into(),
        }
    }
}
