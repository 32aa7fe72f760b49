use crate::common::Detection;
use crate::error::FrameError;
use crate::pipeline::orchestration::{FrameContext, FrameStage, ProcessingStep, StepFlow};
use crate::pipeline::services::routes::RouteResolver;
use async_trait::async_trait;
use std::sync::Arc;

/// Attaches a route record to every decoded code.
pub struct RouteResolutionStep {
    resolver: Arc<RouteResolver>,
}

impl RouteResolutionStep {
    pub fn new(resolver: Arc<RouteResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl ProcessingStep for RouteResolutionStep {
    async fn process(&self, context: &mut FrameContext) -> Result<StepFlow, FrameError> {
        context.advance(FrameStage::Resolving);
        let scale = context.scale;
        let codes = context
            .recognition
            .as_ref()
            .map(|output| output.codes.as_slice())
            .unwrap_or_default();

        context.code_detections = codes
            .iter()
            .map(|code| {
                Detection::code(
                    code.text.clone(),
                    self.resolver.resolve(&code.text),
                    code.bbox.scaled(scale),
                )
            })
            .collect();
        Ok(StepFlow::Continue)
    }

    fn name(&self) -> &'static str {
        "RouteResolutionStep"
    }
}
