use thiserror::Error;

/// Failure of one recognition invocation.
///
/// Per-plate and per-character conditions (empty crops, unknown class
/// ids, zero detections) degrade inside the pipeline and never surface
/// here; only a detector-level failure aborts the invocation. The core
/// never retries a failed detector call.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("detector failure: {0}")]
    Detector(#[source] anyhow::Error),
}
