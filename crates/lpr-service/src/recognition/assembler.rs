use common::recognition::{CharacterDetection, Detection, PlateResult};

use super::{alphabet, geometry, ordering};

/// Build the structured result for one detected plate.
///
/// `char_detections` are the raw character detections found inside the
/// plate crop, in crop-local coordinates, in the detector's emission
/// order. If the plate box clamps to an empty rect against the image
/// dimensions, the plate is still reported with its original box and
/// empty text.
pub fn assemble(
    plate_detection: &Detection,
    char_detections: Vec<Detection>,
    image_width: u32,
    image_height: u32,
) -> PlateResult {
    let clamped = geometry::clamp(&plate_detection.bbox, image_width, image_height);
    if clamped.is_empty() {
        tracing::warn!(
            plate_box = ?plate_detection.bbox,
            image_width,
            image_height,
            "plate box clamps to an empty rect, reporting plate without text"
        );
        return PlateResult {
            plate_text: String::new(),
            plate_box: plate_detection.bbox,
            plate_confidence: plate_detection.confidence,
            character_detections: Vec::new(),
        };
    }

    let ordered = ordering::order_left_to_right(char_detections);
    let character_detections: Vec<CharacterDetection> = ordered
        .into_iter()
        .map(|d| CharacterDetection {
            bbox: d.bbox,
            character: alphabet::label_or_placeholder(d.class_id),
            confidence: d.confidence,
        })
        .collect();

    let plate_text: String = character_detections.iter().map(|c| c.character).collect();

    PlateResult {
        plate_text,
        plate_box: plate_detection.bbox,
        plate_confidence: plate_detection.confidence,
        character_detections,
    }
}
