use common::recognition::Detection;

/// Order character detections left to right by the left edge of their box.
///
/// The key is `x_min`, not the box center: two near-vertical strokes of
/// one character can interleave under a center-x key when their boxes
/// overlap. Ties keep the detector's emission order (the sort is stable),
/// so identical input always yields identical output.
pub fn order_left_to_right(mut detections: Vec<Detection>) -> Vec<Detection> {
    detections.sort_by_key(|d| d.bbox.x_min);
    detections
}
