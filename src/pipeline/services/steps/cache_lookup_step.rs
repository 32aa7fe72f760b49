use crate::error::FrameError;
use crate::pipeline::orchestration::{FrameContext, FrameStage, ProcessingStep, StepFlow};
use crate::pipeline::services::managers::ResultCache;
use crate::pipeline::services::preprocessing::FingerprintHasher;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Fingerprints the payload and short-circuits on a cached result.
pub struct CacheLookupStep {
    hasher: FingerprintHasher,
    cache: Arc<ResultCache>,
}

impl CacheLookupStep {
    pub fn new(hasher: FingerprintHasher, cache: Arc<ResultCache>) -> Self {
        Self { hasher, cache }
    }
}

#[async_trait]
impl ProcessingStep for CacheLookupStep {
    async fn process(&self, context: &mut FrameContext) -> Result<StepFlow, FrameError> {
        let fingerprint = self.hasher.fingerprint(&context.request.payload);
        context.fingerprint = Some(fingerprint);

        match self.cache.get(&fingerprint) {
            Some(result) => {
                debug!("Cache hit for {} ({})", context.request.client_id, fingerprint);
                context.result = Some(result);
                context.advance(FrameStage::CacheHit);
                Ok(StepFlow::Complete)
            }
            None => {
                context.advance(FrameStage::CacheMiss);
                Ok(StepFlow::Continue)
            }
        }
    }

    fn name(&self) -> &'static str {
        "CacheLookupStep"
    }
}
