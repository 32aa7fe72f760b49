use crate::common::FrameResult;
use crate::error::FrameError;
use crate::pipeline::orchestration::{FrameContext, FrameStage, ProcessingStep, StepFlow};
use crate::pipeline::services::managers::ResultCache;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Builds the frame result and stores it under the payload fingerprint.
pub struct CacheStoreStep {
    cache: Arc<ResultCache>,
}

impl CacheStoreStep {
    pub fn new(cache: Arc<ResultCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ProcessingStep for CacheStoreStep {
    async fn process(&self, context: &mut FrameContext) -> Result<StepFlow, FrameError> {
        // Nobody is left to receive the result.
        if context.is_cancelled() {
            context.advance(FrameStage::Abandoned);
            return Ok(StepFlow::Complete);
        }

        let result = FrameResult {
            detections: std::mem::take(&mut context.detections),
            processing_time: context.processing_start.elapsed().as_secs_f64(),
            timestamp: Utc::now().timestamp_millis(),
        };
        if let Some(fingerprint) = context.fingerprint {
            self.cache.put(fingerprint, result.clone());
        }
        context.result = Some(result);
        context.advance(FrameStage::Cached);
        Ok(StepFlow::Complete)
    }

    fn name(&self) -> &'static str {
        "CacheStoreStep"
    }
}
