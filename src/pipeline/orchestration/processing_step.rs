use super::frame_context::FrameContext;
use crate::error::FrameError;
use async_trait::async_trait;

/// What the pipeline does after a step returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepFlow {
    Continue,
    /// The frame reached a terminal outcome; skip the remaining steps.
    Complete,
}

/// Chain of Responsibility pattern for the frame pipeline.
#[async_trait]
pub trait ProcessingStep: Send + Sync {
    async fn process(&self, context: &mut FrameContext) -> Result<StepFlow, FrameError>;
    fn name(&self) -> &'static str;
}
