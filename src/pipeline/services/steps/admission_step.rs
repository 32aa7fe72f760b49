use crate::error::FrameError;
use crate::pipeline::orchestration::{FrameContext, FrameStage, ProcessingStep, StepFlow};
use crate::pipeline::services::managers::AdmissionController;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Drops frames that arrive closer together than the per-client interval.
pub struct AdmissionStep {
    admission: Arc<AdmissionController>,
}

impl AdmissionStep {
    pub fn new(admission: Arc<AdmissionController>) -> Self {
        Self { admission }
    }
}

#[async_trait]
impl ProcessingStep for AdmissionStep {
    async fn process(&self, context: &mut FrameContext) -> Result<StepFlow, FrameError> {
        let client_id = context.request.client_id;
        if context.is_cancelled() {
            context.advance(FrameStage::Abandoned);
            return Ok(StepFlow::Complete);
        }
        if self.admission.admit(client_id, context.request.received_at) {
            context.advance(FrameStage::Admitted);
            Ok(StepFlow::Continue)
        } else {
            debug!("Dropping frame from {} (inside admission interval)", client_id);
            context.advance(FrameStage::Dropped);
            Ok(StepFlow::Complete)
        }
    }

    fn name(&self) -> &'static str {
        "AdmissionStep"
    }
}
