//! The recognition core: geometry clamping, the plate character alphabet,
//! left-to-right character ordering, plate assembly and the two-stage
//! orchestration pipeline.

pub mod alphabet;
pub mod assembler;
pub mod error;
pub mod geometry;
pub mod ordering;
pub mod pipeline;

pub use error::RecognitionError;
pub use pipeline::{PipelineConfig, RecognitionPipeline};
