use crate::error::FrameError;
use crate::pipeline::orchestration::{FrameContext, FrameStage, ProcessingStep, StepFlow};
use crate::pipeline::services::backend::{RecognitionPool, RecognitionRequest, RecognitionTask};
use async_trait::async_trait;
use tower::ServiceExt;
use tracing::debug;

/// Runs both recognition backends on the worker pool, which also downscales
/// the frame.
pub struct RecognitionStep {
    pool: RecognitionPool,
}

impl RecognitionStep {
    pub fn new(pool: RecognitionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessingStep for RecognitionStep {
    async fn process(&self, context: &mut FrameContext) -> Result<StepFlow, FrameError> {
        let image = context
            .image
            .take()
            .ok_or_else(|| FrameError::Incomplete(format!("{:?}", context.stage)))?;
        context.advance(FrameStage::Detecting);

        let request = RecognitionRequest {
            image,
            task: RecognitionTask::Full,
        };
        let cancel = context.request.cancel.clone();
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Client {} left during recognition", context.request.client_id);
                context.advance(FrameStage::Abandoned);
                return Ok(StepFlow::Complete);
            }
            output = self.pool.clone().oneshot(request) => output?,
        };

        context.scale = output.scale;
        context.recognition = Some(output);
        Ok(StepFlow::Continue)
    }

    fn name(&self) -> &'static str {
        "RecognitionStep"
    }
}
