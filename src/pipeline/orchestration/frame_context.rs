use crate::common::{Detection, FrameResult, Scale};
use crate::pipeline::services::backend::RecognitionOutput;
use crate::pipeline::services::preprocessing::Fingerprint;
use image::DynamicImage;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::trace;
use uuid::Uuid;

/// One frame submitted by a client.
#[derive(Debug, Clone)]
pub struct FrameRequest {
    pub client_id: Uuid,
    pub payload: Arc<str>,
    pub received_at: Instant,
    /// Cancelled when the submitting client disconnects.
    pub cancel: CancellationToken,
}

impl FrameRequest {
    pub fn new(client_id: Uuid, payload: impl Into<Arc<str>>) -> Self {
        Self {
            client_id,
            payload: payload.into(),
            received_at: Instant::now(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_received_at(mut self, received_at: Instant) -> Self {
        self.received_at = received_at;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Lifecycle of a frame through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    Received,
    Admitted,
    Decoded,
    CacheHit,
    CacheMiss,
    Detecting,
    Resolving,
    Merged,
    Cached,
    Responded,
    /// Failed; the client gets an error report.
    Rejected,
    /// Refused by the admission gate; the client gets nothing.
    Dropped,
    /// The client went away before the frame finished.
    Abandoned,
}

impl FrameStage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FrameStage::Responded | FrameStage::Rejected | FrameStage::Dropped | FrameStage::Abandoned
        )
    }
}

/// State that flows through the processing steps for a single frame.
pub struct FrameContext {
    pub request: FrameRequest,
    pub stage: FrameStage,
    pub image: Option<DynamicImage>,
    pub fingerprint: Option<Fingerprint>,
    pub recognition: Option<RecognitionOutput>,
    /// Maps backend coordinates back onto the submitted frame.
    pub scale: Scale,
    pub code_detections: Vec<Detection>,
    pub detections: Vec<Detection>,
    pub result: Option<FrameResult>,
    pub metrics: FrameMetrics,
    pub processing_start: Instant,
}

impl FrameContext {
    pub fn new(request: FrameRequest) -> Self {
        Self {
            request,
            stage: FrameStage::Received,
            image: None,
            fingerprint: None,
            recognition: None,
            scale: Scale::IDENTITY,
            code_detections: Vec::new(),
            detections: Vec::new(),
            result: None,
            metrics: FrameMetrics::new(),
            processing_start: Instant::now(),
        }
    }

    pub fn advance(&mut self, stage: FrameStage) {
        trace!(
            "Frame from {:?}: {:?} -> {:?}",
            self.request.client_id,
            self.stage,
            stage
        );
        self.stage = stage;
    }

    pub fn is_cancelled(&self) -> bool {
        self.request.cancel.is_cancelled()
    }
}

/// Timings collected while a frame is processed.
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    step_durations: IndexMap<&'static str, Duration>,
    total: Duration,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_step(&mut self, step: &'static str, duration: Duration) {
        *self.step_durations.entry(step).or_default() += duration;
    }

    pub fn step_duration(&self, step: &str) -> Option<Duration> {
        self.step_durations.get(step).copied()
    }

    pub fn steps(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.step_durations.iter().map(|(name, duration)| (*name, *duration))
    }

    pub fn finalize(&mut self, start_time: Instant) {
        self.total = start_time.elapsed();
    }

    pub fn total(&self) -> Duration {
        self.total
    }
}
