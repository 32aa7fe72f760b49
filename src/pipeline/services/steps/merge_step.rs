use crate::common::Detection;
use crate::error::FrameError;
use crate::pipeline::orchestration::{FrameContext, FrameStage, ProcessingStep, StepFlow};
use crate::pipeline::services::backend::{category_label, RawDetection};
use async_trait::async_trait;
use std::collections::HashSet;

/// Keeps allow-listed objects above the confidence threshold, then appends
/// the resolved codes.
pub struct MergeStep {
    allowed_categories: HashSet<u32>,
    confidence_threshold: f32,
}

impl MergeStep {
    pub fn new(allowed_categories: impl IntoIterator<Item = u32>, confidence_threshold: f32) -> Self {
        Self {
            allowed_categories: allowed_categories.into_iter().collect(),
            confidence_threshold,
        }
    }

    fn keep(&self, raw: &RawDetection) -> bool {
        self.allowed_categories.contains(&raw.category) && raw.confidence > self.confidence_threshold
    }
}

#[async_trait]
impl ProcessingStep for MergeStep {
    async fn process(&self, context: &mut FrameContext) -> Result<StepFlow, FrameError> {
        let scale = context.scale;
        let objects = context
            .recognition
            .as_ref()
            .map(|output| output.objects.as_slice())
            .unwrap_or_default();

        let mut detections: Vec<Detection> = objects
            .iter()
            .filter(|raw| self.keep(raw))
            .map(|raw| Detection::Object {
                label: category_label(raw.category),
                category: raw.category,
                confidence: raw.confidence,
                bbox: raw.bbox.scaled(scale),
            })
            .collect();
        detections.append(&mut context.code_detections);

        context.detections = detections;
        context.advance(FrameStage::Merged);
        Ok(StepFlow::Continue)
    }

    fn name(&self) -> &'static str {
        "MergeStep"
    }
}
