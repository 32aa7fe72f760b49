use crate::common::{CodeScanEntry, CodeScanResult};
use crate::error::{BackendError, FrameError};
use crate::intake::payload::PayloadDecoder;
use crate::pipeline::services::backend::{RecognitionPool, RecognitionRequest, RecognitionTask};
use crate::pipeline::services::routes::RouteResolver;
use std::sync::Arc;
use tower::ServiceExt;
use tracing::debug;

/// Single user-initiated scan of an image for route codes. Scans skip the
/// admission gate and the result cache.
#[derive(Clone)]
pub struct CodeScanner {
    decoder: PayloadDecoder,
    pool: RecognitionPool,
    resolver: Arc<RouteResolver>,
}

impl CodeScanner {
    pub fn new(
        decoder: PayloadDecoder,
        pool: RecognitionPool,
        resolver: Arc<RouteResolver>,
    ) -> Self {
        Self {
            decoder,
            pool,
            resolver,
        }
    }

    pub async fn scan(&self, payload: &str) -> Result<CodeScanResult, FrameError> {
        let decoder = self.decoder;
        let payload = payload.to_owned();
        let image = tokio::task::spawn_blocking(move || decoder.decode_frame(&payload))
            .await
            .map_err(|e| BackendError::WorkerPool(e.to_string()))??;
        let output = self
            .pool
            .clone()
            .oneshot(RecognitionRequest {
                image,
                task: RecognitionTask::CodesOnly,
            })
            .await?;

        let scale = output.scale;
        let entries: Vec<CodeScanEntry> = output
            .codes
            .into_iter()
            .map(|code| {
                let route = self.resolver.resolve(&code.text);
                CodeScanEntry {
                    qr_data: code.text,
                    bus_info: route.clone(),
                    route,
                    bbox: code.bbox.scaled(scale),
                }
            })
            .collect();
        debug!("Code scan found {} codes", entries.len());
        Ok(CodeScanResult::found(entries))
    }
}
