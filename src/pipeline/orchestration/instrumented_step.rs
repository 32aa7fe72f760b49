use super::frame_context::FrameContext;
use super::processing_step::{ProcessingStep, StepFlow};
use crate::error::FrameError;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, instrument};

/// A wrapper that automatically instruments a ProcessingStep with timing and error tracking
pub struct InstrumentedStep<S> {
    inner: S,
}

impl<S> InstrumentedStep<S> {
    pub fn new(step: S) -> Self {
        Self { inner: step }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S> ProcessingStep for InstrumentedStep<S>
where
    S: ProcessingStep,
{
    #[instrument(skip(self, context), fields(step = self.inner.name(), client = %context.request.client_id))]
    async fn process(&self, context: &mut FrameContext) -> Result<StepFlow, FrameError> {
        let start = Instant::now();
        let result = self.inner.process(context).await;
        let duration = start.elapsed();
        context.metrics.record_step(self.inner.name(), duration);

        match &result {
            Ok(flow) => {
                debug!(
                    "Step '{}' finished in {}us ({:?}, stage {:?})",
                    self.inner.name(),
                    duration.as_micros(),
                    flow,
                    context.stage
                );
            }
            Err(e) => {
                debug!(
                    "Step '{}' failed after {}us: {}",
                    self.inner.name(),
                    duration.as_micros(),
                    e
                );
            }
        }

        result
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Extension trait to easily wrap steps with instrumentation
pub trait StepInstrumentation: Sized {
    fn instrumented(self) -> InstrumentedStep<Self>;
}

impl<S> StepInstrumentation for S
where
    S: ProcessingStep,
{
    fn instrumented(self) -> InstrumentedStep<Self> {
        InstrumentedStep::new(self)
    }
}
