use crate::error::{BackendError, FrameError};
use crate::intake::payload::PayloadDecoder;
use crate::pipeline::orchestration::{FrameContext, FrameStage, ProcessingStep, StepFlow};
use async_trait::async_trait;

/// Decodes the payload off the async workers.
pub struct PayloadDecodeStep {
    decoder: PayloadDecoder,
}

impl PayloadDecodeStep {
    pub fn new(decoder: PayloadDecoder) -> Self {
        Self { decoder }
    }
}

#[async_trait]
impl ProcessingStep for PayloadDecodeStep {
    async fn process(&self, context: &mut FrameContext) -> Result<StepFlow, FrameError> {
        let decoder = self.decoder;
        let payload = context.request.payload.clone();
        let image = tokio::task::spawn_blocking(move || decoder.decode_frame(&payload))
            .await
            .map_err(|e| BackendError::WorkerPool(e.to_string()))??;
        context.image = Some(image);
        context.advance(FrameStage::Decoded);
        Ok(StepFlow::Continue)
    }

    fn name(&self) -> &'static str {
        "PayloadDecodeStep"
    }
}
