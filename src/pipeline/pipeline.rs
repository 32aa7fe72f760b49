use crate::common::FrameResult;
use crate::config::Configuration;
use crate::error::{AppError, FrameError};
use crate::intake::payload::PayloadDecoder;
use crate::pipeline::code_scan::CodeScanner;
use crate::pipeline::orchestration::{
    FrameContext, FrameRequest, FrameStage, ProcessingStep, StepFlow, StepInstrumentation,
};
use crate::pipeline::services::backend::{
    CodeReader, Detector, DisabledCodeReader, DisabledDetector, RecognitionPool,
};
use crate::pipeline::services::managers::{AdmissionController, ResultCache};
use crate::pipeline::services::preprocessing::{FingerprintHasher, FrameResizer};
use crate::pipeline::services::routes::{RouteResolver, RouteTable};
use crate::pipeline::services::steps::{
    AdmissionStep, CacheLookupStep, CacheStoreStep, MergeStep, PayloadDecodeStep, RecognitionStep,
    RouteResolutionStep,
};
use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Duration,
};
use tower::Service;
use tracing::{debug, error, info, warn};

/// How a single frame left the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Responded(FrameResult),
    Rejected(FrameError),
    /// Refused by the admission gate. Nothing is sent back.
    Dropped,
    /// The client disconnected first. Nothing is sent back or cached.
    Abandoned,
}

struct PipelineInner {
    configuration: Configuration,
    steps: Vec<Box<dyn ProcessingStep>>,
    admission: Arc<AdmissionController>,
    cache: Arc<ResultCache>,
    resolver: Arc<RouteResolver>,
    scanner: CodeScanner,
    worker_count: usize,
    slow_frame_threshold: Duration,
    slow_frames: AtomicU64,
}

/// Frame admission, caching and recognition for every connected client.
/// Clones share all state.
#[derive(Clone)]
pub struct FramePipeline {
    inner: Arc<PipelineInner>,
}

impl FramePipeline {
    pub fn builder(configuration: Configuration) -> FramePipelineBuilder {
        FramePipelineBuilder::new(configuration)
    }

    pub async fn process(&self, request: FrameRequest) -> FrameOutcome {
        let mut context = FrameContext::new(request);
        let failure = self.run_steps(&mut context).await;

        context.metrics.finalize(context.processing_start);
        self.report_timing(&context);
        match failure {
            Some(e) => FrameOutcome::Rejected(e),
            None => Self::conclude(context),
        }
    }

    async fn run_steps(&self, context: &mut FrameContext) -> Option<FrameError> {
        for step in &self.inner.steps {
            match step.process(context).await {
                Ok(StepFlow::Continue) => {}
                Ok(StepFlow::Complete) => break,
                Err(e) => {
                    context.advance(FrameStage::Rejected);
                    match &e {
                        FrameError::Backend(_) => error!(
                            "Frame from {} failed in {}: {}",
                            context.request.client_id,
                            step.name(),
                            e
                        ),
                        _ => warn!(
                            "Frame from {} rejected in {}: {}",
                            context.request.client_id,
                            step.name(),
                            e
                        ),
                    }
                    return Some(e);
                }
            }
        }
        None
    }

    fn conclude(mut context: FrameContext) -> FrameOutcome {
        match context.stage {
            FrameStage::Dropped => FrameOutcome::Dropped,
            FrameStage::Abandoned => FrameOutcome::Abandoned,
            stage => match context.result.take() {
                Some(result) => {
                    context.advance(FrameStage::Responded);
                    FrameOutcome::Responded(result)
                }
                None => FrameOutcome::Rejected(FrameError::Incomplete(format!("{:?}", stage))),
            },
        }
    }

    fn report_timing(&self, context: &FrameContext) {
        let total = context.metrics.total();
        if total > self.inner.slow_frame_threshold {
            self.inner.slow_frames.fetch_add(1, Ordering::Relaxed);
            let breakdown: Vec<String> = context
                .metrics
                .steps()
                .map(|(name, duration)| format!("{}={}ms", name, duration.as_millis()))
                .collect();
            warn!(
                "Slow frame from {} ({:?}): {}ms [{}]",
                context.request.client_id,
                context.stage,
                total.as_millis(),
                breakdown.join(", ")
            );
        } else {
            debug!(
                "Frame from {} finished as {:?} in {}us",
                context.request.client_id,
                context.stage,
                total.as_micros()
            );
        }
    }

    /// Scanner sharing this pipeline's worker pool and route table.
    pub fn code_scanner(&self) -> &CodeScanner {
        &self.inner.scanner
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.inner.admission
    }

    pub fn routes(&self) -> &RouteTable {
        self.inner.resolver.table()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.inner.cache
    }

    pub fn worker_count(&self) -> usize {
        self.inner.worker_count
    }

    /// Frames, whatever their outcome, that exceeded the slow-frame threshold.
    pub fn slow_frames(&self) -> u64 {
        self.inner.slow_frames.load(Ordering::Relaxed)
    }

    /// Effective settings, builder overrides included.
    pub fn configuration(&self) -> &Configuration {
        &self.inner.configuration
    }

    /// Releases per-client state once a client disconnects.
    pub fn forget_client(&self, client_id: &uuid::Uuid) {
        self.inner.admission.forget(client_id);
    }
}

impl Service<FrameRequest> for FramePipeline {
    type Response = FrameOutcome;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: FrameRequest) -> Self::Future {
        let pipeline = self.clone();
        Box::pin(async move { Ok(pipeline.process(request).await) })
    }
}

pub struct FramePipelineBuilder {
    configuration: Configuration,
    detector: Option<Arc<dyn Detector>>,
    code_reader: Option<Arc<dyn CodeReader>>,
    route_table: Option<RouteTable>,
}

impl FramePipelineBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            detector: None,
            code_reader: None,
            route_table: None,
        }
    }

    // Overrides the configured admission interval.
    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.configuration.admission.min_interval_ms = min_interval.as_millis() as u64;
        self
    }

    // Overrides the configured cache capacity.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.configuration.cache.capacity = capacity;
        self
    }

    // Overrides the configured number of recognition workers.
    pub fn worker_count(mut self, worker_count: usize) -> Self {
        self.configuration.detection.worker_count = Some(worker_count);
        self
    }

    pub fn max_dimension(mut self, max_dimension: u32) -> Self {
        self.configuration.detection.max_dimension = max_dimension;
        self
    }

    pub fn detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn code_reader(mut self, code_reader: Arc<dyn CodeReader>) -> Self {
        self.code_reader = Some(code_reader);
        self
    }

    pub fn route_table(mut self, route_table: RouteTable) -> Self {
        self.route_table = Some(route_table);
        self
    }

    pub fn build(self) -> Result<FramePipeline, AppError> {
        let configuration = self.configuration;
        let route_table = match (self.route_table, &configuration.routes.table_path) {
            (Some(table), _) => table,
            (None, Some(path)) => RouteTable::load(path)?,
            (None, None) => RouteTable::bundled()?,
        };
        let detector = self.detector.unwrap_or_else(|| {
            warn!("No detector configured; object detection is disabled");
            Arc::new(DisabledDetector)
        });
        let code_reader = self.code_reader.unwrap_or_else(|| {
            warn!("No code reader configured; code scanning is disabled");
            Arc::new(DisabledCodeReader)
        });

        let worker_count = configuration.detection.resolved_worker_count();
        let resizer = FrameResizer::new(configuration.detection.max_dimension);
        let pool = RecognitionPool::new(detector, code_reader, resizer, worker_count);
        let admission = Arc::new(AdmissionController::new(
            configuration.admission.min_interval(),
        ));
        let cache = Arc::new(ResultCache::new(configuration.cache.capacity));
        let resolver = Arc::new(RouteResolver::new(route_table));
        let decoder = PayloadDecoder::new();

        let steps: Vec<Box<dyn ProcessingStep>> = vec![
            Box::new(AdmissionStep::new(admission.clone()).instrumented()),
            Box::new(PayloadDecodeStep::new(decoder).instrumented()),
            Box::new(
                CacheLookupStep::new(
                    FingerprintHasher::new(configuration.cache.fingerprint_prefix_chars),
                    cache.clone(),
                )
                .instrumented(),
            ),
            Box::new(RecognitionStep::new(pool.clone()).instrumented()),
            Box::new(RouteResolutionStep::new(resolver.clone()).instrumented()),
            Box::new(
                MergeStep::new(
                    configuration.detection.allowed_categories.iter().copied(),
                    configuration.detection.confidence_threshold,
                )
                .instrumented(),
            ),
            Box::new(CacheStoreStep::new(cache.clone()).instrumented()),
        ];

        info!(
            "Frame pipeline ready: {} workers, cache capacity {}, {} routes, min interval {:?}",
            worker_count,
            cache.capacity(),
            resolver.table().len(),
            admission.min_interval()
        );

        Ok(FramePipeline {
            inner: Arc::new(PipelineInner {
                steps,
                admission,
                cache,
                scanner: CodeScanner::new(decoder, pool, resolver.clone()),
                resolver,
                worker_count,
                slow_frame_threshold: configuration.detection.slow_frame_threshold(),
                slow_frames: AtomicU64::new(0),
                configuration,
            }),
        })
    }
}
