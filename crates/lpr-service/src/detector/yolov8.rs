/// YOLOv8 object detector backed by ONNX Runtime.
///
/// Both recognition stages (plate localization and character localization)
/// use this detector, loaded from different model files. The confidence
/// threshold is supplied per call by the pipeline; NMS and the detection
/// cap are model-level policy and live in the config.
use super::Detector;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use common::recognition::{Detection, Rect};
use image::DynamicImage;
use ndarray::{Array, IxDyn};
use ort::{
    execution_providers::{CPUExecutionProvider, CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloV8Config {
    /// Path to the ONNX model file
    pub model_path: String,

    /// Model input size (width and height)
    #[serde(default = "default_input_size")]
    pub input_size: u32,

    /// IoU (Intersection over Union) threshold for NMS
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,

    /// Maximum number of detections kept per invocation
    #[serde(default = "default_max_detections")]
    pub max_detections: usize,

    /// Execution provider preference (CPU, CUDA, TensorRT)
    #[serde(default = "default_execution_provider")]
    pub execution_provider: String,

    /// GPU device ID (0, 1, 2, etc.)
    #[serde(default = "default_device_id")]
    pub device_id: i32,

    /// Number of intra-operation threads
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,

    /// Number of inter-operation threads
    #[serde(default = "default_inter_threads")]
    pub inter_threads: usize,
}

fn default_input_size() -> u32 {
    640
}

fn default_iou_threshold() -> f32 {
    0.45
}

fn default_max_detections() -> usize {
    10
}

fn default_execution_provider() -> String {
    "CUDA".to_string()
}

fn default_device_id() -> i32 {
    0
}

fn default_intra_threads() -> usize {
    4
}

fn default_inter_threads() -> usize {
    1
}

impl YoloV8Config {
    /// Config for the given model file with default tuning.
    pub fn for_model(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            input_size: default_input_size(),
            iou_threshold: default_iou_threshold(),
            max_detections: default_max_detections(),
            execution_provider: default_execution_provider(),
            device_id: default_device_id(),
            intra_threads: default_intra_threads(),
            inter_threads: default_inter_threads(),
        }
    }
}

/// YOLOv8 detector stage
pub struct YoloV8Detector {
    id: String,
    config: YoloV8Config,
    session: Mutex<Session>,
    execution_provider: String,
}

impl YoloV8Detector {
    /// Load the ONNX model, falling back through execution providers.
    pub fn load(id: impl Into<String>, config: YoloV8Config) -> Result<Self> {
        let id = id.into();
        let (session, execution_provider) = create_session(&config)?;

        tracing::info!(
            "Initialized YOLOv8 detector '{}' - model: {}, provider: {}, device: {}, input_size: {}",
            id,
            config.model_path,
            execution_provider,
            config.device_id,
            config.input_size
        );

        Ok(Self {
            id,
            config,
            session: Mutex::new(session),
            execution_provider,
        })
    }

    /// Convert an image to the model's NCHW float input, normalized to [0, 1].
    fn preprocess(&self, img: &DynamicImage) -> Array<f32, IxDyn> {
        let size = self.config.input_size;
        let resized = img.resize_exact(size, size, image::imageops::FilterType::Triangle);
        let rgb_img = resized.to_rgb8();

        let mut input = Array::zeros(IxDyn(&[1, 3, size as usize, size as usize]));

        for (x, y, pixel) in rgb_img.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        input
    }
}

#[async_trait]
impl Detector for YoloV8Detector {
    fn id(&self) -> &str {
        &self.id
    }

    async fn detect(
        &self,
        image: &DynamicImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>> {
        let input_array = self.preprocess(image);
        let input_tensor = Value::from_array(input_array)?;

        let inference_start = Instant::now();
        let output = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow!("failed to lock session: {}", e))?;
            let outputs = session.run(ort::inputs![input_tensor])?;

            // Try common YOLO output names
            let output_value = outputs
                .get("output0")
                .or_else(|| outputs.get("output"))
                .or_else(|| outputs.get("boxes"))
                .context("no detection output tensor found (tried: output0, output, boxes)")?;
            let (shape, data) = output_value.try_extract_tensor::<f32>()?;

            let shape_usize: Vec<usize> = shape.as_ref().iter().map(|&x| x as usize).collect();
            Array::from_shape_vec(IxDyn(&shape_usize), data.to_vec())?
        };
        let inference_time = inference_start.elapsed();

        telemetry::metrics::LPR_INFERENCE_TIME
            .with_label_values(&[&self.id, &self.execution_provider])
            .observe(inference_time.as_secs_f64());

        decode_output(
            &output,
            image.width(),
            image.height(),
            confidence_threshold,
            &self.config,
        )
    }
}

/// Decode a raw YOLOv8 output tensor into detections in the coordinate
/// space of the original pixel buffer.
///
/// Expected shape: `[batch, 4 + num_classes, num_predictions]` with box
/// rows as (cx, cy, w, h) in model-input coordinates.
fn decode_output(
    output: &Array<f32, IxDyn>,
    original_width: u32,
    original_height: u32,
    confidence_threshold: f32,
    config: &YoloV8Config,
) -> Result<Vec<Detection>> {
    let shape = output.shape();
    anyhow::ensure!(
        shape.len() == 3 && shape[1] > 4,
        "unexpected detection output shape {:?}",
        shape
    );

    let scale_x = original_width as f32 / config.input_size as f32;
    let scale_y = original_height as f32 / config.input_size as f32;

    let num_classes = shape[1] - 4;
    let num_predictions = shape[2];

    let mut boxes = Vec::new();

    for i in 0..num_predictions {
        // Class with the highest score wins
        let mut max_class_score = 0.0f32;
        let mut max_class_idx = 0usize;
        for class_idx in 0..num_classes {
            let score = output[[0, 4 + class_idx, i]];
            if score > max_class_score {
                max_class_score = score;
                max_class_idx = class_idx;
            }
        }

        if max_class_score < confidence_threshold {
            continue;
        }

        // Box is (cx, cy, w, h) in model-input coordinates
        let cx = output[[0, 0, i]];
        let cy = output[[0, 1, i]];
        let w = output[[0, 2, i]];
        let h = output[[0, 3, i]];

        let x_min = ((cx - w / 2.0) * scale_x).max(0.0) as u32;
        let y_min = ((cy - h / 2.0) * scale_y).max(0.0) as u32;
        let x_max = (((cx + w / 2.0) * scale_x).max(0.0) as u32).min(original_width);
        let y_max = (((cy + h / 2.0) * scale_y).max(0.0) as u32).min(original_height);

        let bbox = match Rect::new(x_min.min(x_max), y_min.min(y_max), x_max, y_max) {
            Ok(rect) if !rect.is_empty() => rect,
            _ => continue,
        };

        match Detection::new(bbox, max_class_idx as u32, max_class_score.min(1.0)) {
            Ok(detection) => boxes.push(detection),
            Err(e) => tracing::warn!("skipping malformed detection: {}", e),
        }
    }

    let filtered = non_max_suppress(boxes, config.iou_threshold);
    Ok(filtered
        .into_iter()
        .take(config.max_detections)
        .collect())
}

/// Non-Maximum Suppression: keep the highest-confidence box among each
/// overlapping cluster.
fn non_max_suppress(boxes: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if boxes.is_empty() {
        return vec![];
    }

    let mut sorted_boxes = boxes;
    sorted_boxes.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();

    while !sorted_boxes.is_empty() {
        let current = sorted_boxes.remove(0);
        keep.push(current);

        sorted_boxes.retain(|candidate| iou(&current.bbox, &candidate.bbox) < iou_threshold);
    }

    keep
}

/// Intersection over Union of two rectangles.
fn iou(a: &Rect, b: &Rect) -> f32 {
    let x1 = a.x_min.max(b.x_min);
    let y1 = a.y_min.max(b.y_min);
    let x2 = a.x_max.min(b.x_max);
    let y2 = a.y_max.min(b.y_max);

    let intersection = if x2 > x1 && y2 > y1 {
        ((x2 - x1) * (y2 - y1)) as f32
    } else {
        0.0
    };

    let area_a = (a.width() * a.height()) as f32;
    let area_b = (b.width() * b.height()) as f32;
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Create an ONNX session honoring the execution provider preference,
/// degrading TensorRT -> CUDA -> CPU.
fn create_session(config: &YoloV8Config) -> Result<(Session, String)> {
    match config.execution_provider.to_uppercase().as_str() {
        "TENSORRT" => {
            tracing::info!("Attempting TensorRT for {}", config.model_path);
            let result = session_builder(config)?
                .with_execution_providers([
                    TensorRTExecutionProvider::default()
                        .with_device_id(config.device_id)
                        .build(),
                    CUDAExecutionProvider::default()
                        .with_device_id(config.device_id)
                        .build(),
                    CPUExecutionProvider::default().build(),
                ])
                .context("Failed to set execution providers")?
                .commit_from_file(&config.model_path);

            match result {
                Ok(session) => Ok((session, "TensorRT".to_string())),
                Err(e) => {
                    tracing::warn!("TensorRT failed, trying CUDA: {}", e);
                    try_cuda(config)
                }
            }
        }
        "CUDA" => try_cuda(config),
        _ => try_cpu(config),
    }
}

fn try_cuda(config: &YoloV8Config) -> Result<(Session, String)> {
    tracing::info!("Attempting CUDA for {}", config.model_path);
    let result = session_builder(config)?
        .with_execution_providers([
            CUDAExecutionProvider::default()
                .with_device_id(config.device_id)
                .build(),
            CPUExecutionProvider::default().build(),
        ])
        .context("Failed to set execution providers")?
        .commit_from_file(&config.model_path);

    match result {
        Ok(session) => Ok((session, "CUDA".to_string())),
        Err(e) => {
            tracing::warn!("CUDA failed, using CPU: {}", e);
            try_cpu(config)
        }
    }
}

fn try_cpu(config: &YoloV8Config) -> Result<(Session, String)> {
    tracing::info!("Using CPU for {}", config.model_path);
    let session = session_builder(config)?
        .commit_from_file(&config.model_path)
        .context("Failed to load model from file")?;
    Ok((session, "CPU".to_string()))
}

fn session_builder(config: &YoloV8Config) -> Result<ort::session::builder::SessionBuilder> {
    Session::builder()
        .context("Failed to create session builder")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(config.intra_threads)
        .context("Failed to set intra threads")?
        .with_inter_threads(config.inter_threads)
        .context("Failed to set inter threads")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> YoloV8Config {
        YoloV8Config::for_model("models/test.onnx")
    }

    fn rect(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Rect {
        Rect::new(x_min, y_min, x_max, y_max).unwrap()
    }

    fn detection(bbox: Rect, confidence: f32) -> Detection {
        Detection::new(bbox, 0, confidence).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = test_config();
        assert_eq!(config.input_size, 640);
        assert_eq!(config.iou_threshold, 0.45);
        assert_eq!(config.max_detections, 10);
        assert_eq!(config.execution_provider, "CUDA");
        assert_eq!(config.device_id, 0);
    }

    #[test]
    fn test_iou() {
        let a = rect(10, 10, 60, 30);
        let b = rect(30, 15, 80, 35);

        let overlap = iou(&a, &b);
        assert!(overlap > 0.0 && overlap < 1.0);

        // Identical boxes
        assert!((iou(&a, &a) - 1.0).abs() < 0.001);

        // Non-overlapping boxes
        let c = rect(100, 100, 150, 120);
        assert_eq!(iou(&a, &c), 0.0);
    }

    #[test]
    fn test_nms_keeps_highest_confidence() {
        let boxes = vec![
            detection(rect(10, 10, 110, 40), 0.9),
            detection(rect(15, 12, 115, 42), 0.8),
            detection(rect(200, 200, 300, 230), 0.85),
        ];

        let filtered = non_max_suppress(boxes, 0.45);
        // Highest-confidence overlapping box plus the distant one
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].confidence, 0.9);
    }

    #[test]
    fn test_decode_output_filters_and_rescales() {
        let config = test_config();

        // One prediction: a single-class model, shape [1, 5, 2]
        // Prediction 0: box centered at (320, 320), 100x50, score 0.9
        // Prediction 1: score 0.2, below threshold
        let data = vec![
            320.0, 100.0, // cx
            320.0, 100.0, // cy
            100.0, 10.0, // w
            50.0, 10.0, // h
            0.9, 0.2, // class 0 score
        ];
        let output = Array::from_shape_vec(IxDyn(&[1, 5, 2]), data).unwrap();

        // 640x640 image: scale is 1:1
        let detections = decode_output(&output, 640, 640, 0.5, &config).unwrap();
        assert_eq!(detections.len(), 1);

        let d = &detections[0];
        assert_eq!(d.bbox, rect(270, 295, 370, 345));
        assert_eq!(d.class_id, 0);
        assert_eq!(d.confidence, 0.9);
    }

    #[test]
    fn test_decode_output_picks_argmax_class() {
        let config = test_config();

        // Two-class model, one prediction: shape [1, 6, 1]
        let data = vec![320.0, 320.0, 100.0, 50.0, 0.3, 0.8];
        let output = Array::from_shape_vec(IxDyn(&[1, 6, 1]), data).unwrap();

        let detections = decode_output(&output, 640, 640, 0.5, &config).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 1);
    }

    #[test]
    fn test_decode_output_rejects_bad_shape() {
        let output = Array::from_shape_vec(IxDyn(&[1, 4]), vec![0.0; 4]).unwrap();
        assert!(decode_output(&output, 640, 640, 0.5, &test_config()).is_err());
    }
}
