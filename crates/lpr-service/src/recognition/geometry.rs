use common::recognition::Rect;
use image::DynamicImage;

/// Clamp a full-image rectangle to the image bounds.
///
/// A box lying partly outside the image keeps its in-bounds part; a box
/// entirely outside collapses to an empty rect. Callers must check
/// `is_empty` before cropping and treat an empty rect as an unusable crop.
/// No coordinate-space conversion happens here.
pub fn clamp(rect: &Rect, image_width: u32, image_height: u32) -> Rect {
    Rect {
        x_min: rect.x_min.min(image_width),
        y_min: rect.y_min.min(image_height),
        x_max: rect.x_max.min(image_width),
        y_max: rect.y_max.min(image_height),
    }
}

/// Extract the pixels of a non-empty clamped rect as a new image.
pub fn crop(image: &DynamicImage, rect: &Rect) -> DynamicImage {
    image.crop_imm(rect.x_min, rect.y_min, rect.width(), rect.height())
}
