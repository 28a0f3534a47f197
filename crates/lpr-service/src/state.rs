use std::sync::Arc;

use crate::recognition::RecognitionPipeline;

/// Shared service state handed to every request handler.
#[derive(Clone)]
pub struct LprServiceState {
    inner: Arc<LprServiceStateInner>,
}

struct LprServiceStateInner {
    pipeline: RecognitionPipeline,
    model_used: String,
}

impl LprServiceState {
    pub fn new(pipeline: RecognitionPipeline, model_used: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(LprServiceStateInner {
                pipeline,
                model_used: model_used.into(),
            }),
        }
    }

    pub fn pipeline(&self) -> &RecognitionPipeline {
        &self.inner.pipeline
    }

    /// Model identifier reported in recognition responses.
    pub fn model_used(&self) -> &str {
        &self.inner.model_used
    }
}
