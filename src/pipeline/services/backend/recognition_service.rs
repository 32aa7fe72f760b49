use crate::common::Scale;
use crate::error::BackendError;
use crate::pipeline::services::backend::{CodeReader, DecodedCode, Detector, RawDetection};
use crate::pipeline::services::preprocessing::FrameResizer;
use image::DynamicImage;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::Semaphore;
use tower::Service;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionTask {
    /// Object detection and code reading.
    Full,
    CodesOnly,
}

/// A decoded frame at its submitted size. Downscaling happens on the worker.
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub image: DynamicImage,
    pub task: RecognitionTask,
}

/// Backend output in resized-frame coordinates, plus the factors that map
/// them back onto the submitted frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionOutput {
    pub objects: Vec<RawDetection>,
    pub codes: Vec<DecodedCode>,
    pub scale: Scale,
}

/// Runs downscaling and the recognition backends on tokio's blocking threads
/// so the async workers stay free for admission checks and cache hits.
///
/// At most `workers` backend calls run at once. A worker is held by the
/// blocking closure itself, so dropping a response future early does not
/// free it before the backend returns. Clones share the same workers.
#[derive(Clone)]
pub struct RecognitionPool {
    detector: Arc<dyn Detector>,
    code_reader: Arc<dyn CodeReader>,
    resizer: FrameResizer,
    workers: Arc<Semaphore>,
    worker_count: usize,
}

impl RecognitionPool {
    pub fn new(
        detector: Arc<dyn Detector>,
        code_reader: Arc<dyn CodeReader>,
        resizer: FrameResizer,
        workers: usize,
    ) -> Self {
        let worker_count = workers.max(1);
        Self {
            detector,
            code_reader,
            resizer,
            workers: Arc::new(Semaphore::new(worker_count)),
            worker_count,
        }
    }

    /// Workers not currently running a backend call.
    pub fn idle_workers(&self) -> usize {
        self.workers.available_permits()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl Service<RecognitionRequest> for RecognitionPool {
    type Response = RecognitionOutput;
    type Error = BackendError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: RecognitionRequest) -> Self::Future {
        let detector = Arc::clone(&self.detector);
        let code_reader = Arc::clone(&self.code_reader);
        let resizer = self.resizer;
        let workers = Arc::clone(&self.workers);
        Box::pin(async move {
            let worker = workers
                .acquire_owned()
                .await
                .map_err(|e| BackendError::WorkerPool(e.to_string()))?;
            tokio::task::spawn_blocking(move || -> Result<RecognitionOutput, BackendError> {
                let _worker = worker;
                let prepared = resizer.prepare(request.image);
                let objects = match request.task {
                    RecognitionTask::Full => detector.infer(&prepared.image)?,
                    RecognitionTask::CodesOnly => Vec::new(),
                };
                let codes = code_reader.scan(&prepared.image)?;
                debug!(
                    "Recognition produced {} objects and {} codes",
                    objects.len(),
                    codes.len()
                );
                Ok(RecognitionOutput {
                    objects,
                    codes,
                    scale: prepared.scale,
                })
            })
            .await
            .map_err(|e| BackendError::WorkerPool(e.to_string()))?
        })
    }
}
