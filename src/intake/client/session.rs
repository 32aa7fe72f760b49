use crate::network::message::{InboundMessage, OutboundMessage};
use crate::pipeline::{FrameOutcome, FramePipeline, FrameRequest};
use futures::{
    future::{self, BoxFuture},
    stream::FuturesOrdered,
    FutureExt, Sink, SinkExt, Stream, StreamExt,
};
use std::fmt::Display;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type PendingReply = BoxFuture<'static, Option<OutboundMessage>>;

/// One connected client. Work for each inbound event runs on its own task;
/// replies leave in the order the events arrived.
pub struct ClientSession {
    id: Uuid,
    pipeline: FramePipeline,
    cancel: CancellationToken,
    max_in_flight: usize,
    in_flight: FuturesOrdered<PendingReply>,
}

impl ClientSession {
    pub fn new(
        id: Uuid,
        pipeline: FramePipeline,
        cancel: CancellationToken,
        max_in_flight: usize,
    ) -> Self {
        Self {
            id,
            pipeline,
            cancel,
            max_in_flight: max_in_flight.max(1),
            in_flight: FuturesOrdered::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Serves the client until its inbound stream ends, the outbound sink
    /// fails or the session is cancelled. Frames still in flight at that
    /// point are abandoned.
    pub async fn run<I, O>(mut self, mut inbound: I, mut outbound: O)
    where
        I: Stream<Item = String> + Unpin,
        O: Sink<OutboundMessage> + Unpin,
        O::Error: Display,
    {
        info!("Running session for {:?}", self.id);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Session for {:?} cancelled", self.id);
                    break;
                }
                message = inbound.next() => match message {
                    Some(text) => self.accept(&text),
                    None => {
                        debug!("Client {:?} has disconnected", self.id);
                        break;
                    }
                },
                Some(reply) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    if let Some(reply) = reply {
                        if let Err(e) = outbound.send(reply).await {
                            warn!("Failed to send reply to {:?}: {}", self.id, e);
                            break;
                        }
                    }
                }
            }
        }
        self.close();
    }

    fn accept(&mut self, text: &str) {
        let received_at = Instant::now();
        let message = match text.parse::<InboundMessage>() {
            Ok(message) => message,
            Err(e) => {
                warn!("Unreadable message from {:?}: {}", self.id, e);
                let reply = OutboundMessage::error(format!("Invalid message: {}", e));
                self.in_flight.push_back(future::ready(Some(reply)).boxed());
                return;
            }
        };

        if self.in_flight.len() >= self.max_in_flight {
            warn!(
                "Client {:?} already has {} requests in flight, dropping",
                self.id,
                self.in_flight.len()
            );
            return;
        }

        let reply = match message {
            InboundMessage::ProcessFrame(payload) => self.spawn_frame(payload, received_at),
            InboundMessage::ProcessQrcode(payload) => self.spawn_code_scan(payload),
        };
        self.in_flight.push_back(reply);
    }

    fn spawn_frame(&self, payload: String, received_at: Instant) -> PendingReply {
        let request = FrameRequest::new(self.id, payload)
            .with_received_at(received_at)
            .with_cancellation(self.cancel.clone());
        let pipeline = self.pipeline.clone();
        let task = tokio::spawn(async move {
            pipeline
                .oneshot(request)
                .await
                .unwrap_or_else(|never| match never {})
        });

        async move {
            match task.await {
                Ok(FrameOutcome::Responded(result)) => Some(OutboundMessage::DetectionResults(result)),
                Ok(FrameOutcome::Rejected(e)) => Some(OutboundMessage::error(e)),
                Ok(FrameOutcome::Dropped | FrameOutcome::Abandoned) => None,
                Err(e) => {
                    error!("Frame task failed: {}", e);
                    Some(OutboundMessage::error(e))
                }
            }
        }
        .boxed()
    }

    fn spawn_code_scan(&self, payload: String) -> PendingReply {
        let scanner = self.pipeline.code_scanner().clone();
        let cancel = self.cancel.clone();
        let client_id = self.id;
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Client {:?} left before its code scan finished", client_id);
                    None
                }
                result = scanner.scan(&payload) => Some(result),
            }
        });

        async move {
            match task.await {
                Ok(Some(Ok(result))) => Some(OutboundMessage::QrcodeResults(result)),
                Ok(Some(Err(e))) => Some(OutboundMessage::error(e)),
                Ok(None) => None,
                Err(e) => {
                    error!("Code scan task failed: {}", e);
                    Some(OutboundMessage::error(e))
                }
            }
        }
        .boxed()
    }

    fn close(&mut self) {
        if !self.in_flight.is_empty() {
            debug!(
                "Abandoning {} requests from {:?}",
                self.in_flight.len(),
                self.id
            );
        }
        self.cancel.cancel();
        self.pipeline.forget_client(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::test_utils::{png_payload, raw, ScriptedCodeReader, ScriptedDetector};
    use futures::channel::mpsc;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn pipeline(min_interval: Duration, detector_delay: Duration) -> FramePipeline {
        FramePipeline::builder(Configuration::default())
            .min_interval(min_interval)
            .worker_count(2)
            .detector(Arc::new(ScriptedDetector::slow(
                vec![raw(0, 0.9, [0, 0, 2, 2])],
                detector_delay,
            )))
            .code_reader(Arc::new(ScriptedCodeReader::new(vec!["4"])))
            .build()
            .unwrap()
    }

    fn frame_event(seed: u8) -> String {
        json!({"event": "process_frame", "data": png_payload(8, 8, seed)}).to_string()
    }

    fn code_event(seed: u8) -> String {
        json!({"event": "process_qrcode", "data": png_payload(8, 8, seed)}).to_string()
    }

    #[tokio::test]
    async fn replies_follow_arrival_order() {
        let pipeline = pipeline(Duration::ZERO, Duration::from_millis(200));
        let (inbound_tx, inbound_rx) = mpsc::unbounded();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded();
        let session = ClientSession::new(Uuid::new_v4(), pipeline, CancellationToken::new(), 8);
        let running = tokio::spawn(session.run(inbound_rx, outbound_tx));

        inbound_tx.unbounded_send(frame_event(1)).unwrap();
        inbound_tx.unbounded_send(code_event(2)).unwrap();

        let first = outbound_rx.next().await.unwrap();
        let second = outbound_rx.next().await.unwrap();
        assert!(matches!(first, OutboundMessage::DetectionResults(_)));
        assert!(matches!(second, OutboundMessage::QrcodeResults(_)));

        drop(inbound_tx);
        running.await.unwrap();
    }

    #[tokio::test]
    async fn rate_limited_frames_get_no_reply() {
        let pipeline = pipeline(Duration::from_secs(1), Duration::ZERO);
        let (inbound_tx, inbound_rx) = mpsc::unbounded();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded();
        let session = ClientSession::new(Uuid::new_v4(), pipeline, CancellationToken::new(), 8);
        let running = tokio::spawn(session.run(inbound_rx, outbound_tx));

        inbound_tx.unbounded_send(frame_event(1)).unwrap();
        inbound_tx.unbounded_send(frame_event(2)).unwrap();
        let reply = outbound_rx.next().await.unwrap();
        assert!(matches!(reply, OutboundMessage::DetectionResults(_)));

        // Let the dropped frame finish before closing.
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(inbound_tx);
        running.await.unwrap();
        assert!(outbound_rx.next().await.is_none());
    }

    #[tokio::test]
    async fn unreadable_messages_get_an_error_reply() {
        let pipeline = pipeline(Duration::ZERO, Duration::ZERO);
        let (inbound_tx, inbound_rx) = mpsc::unbounded();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded();
        let session = ClientSession::new(Uuid::new_v4(), pipeline, CancellationToken::new(), 8);
        let running = tokio::spawn(session.run(inbound_rx, outbound_tx));

        inbound_tx.unbounded_send("{\"event\":\"nope\"}".to_string()).unwrap();
        let reply = outbound_rx.next().await.unwrap();
        assert!(matches!(reply, OutboundMessage::DetectionError(_)));

        drop(inbound_tx);
        running.await.unwrap();
    }

    #[tokio::test]
    async fn requests_beyond_the_in_flight_cap_are_dropped() {
        let pipeline = pipeline(Duration::ZERO, Duration::from_millis(200));
        let (inbound_tx, inbound_rx) = mpsc::unbounded();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded();
        let session = ClientSession::new(Uuid::new_v4(), pipeline, CancellationToken::new(), 1);
        let running = tokio::spawn(session.run(inbound_rx, outbound_tx));

        inbound_tx.unbounded_send(frame_event(1)).unwrap();
        inbound_tx.unbounded_send(frame_event(2)).unwrap();
        let reply = outbound_rx.next().await.unwrap();
        assert!(matches!(reply, OutboundMessage::DetectionResults(_)));

        drop(inbound_tx);
        running.await.unwrap();
        assert!(outbound_rx.next().await.is_none());
    }

    #[tokio::test]
    async fn disconnect_abandons_in_flight_frames() {
        let pipeline = pipeline(Duration::ZERO, Duration::from_millis(200));
        let (inbound_tx, inbound_rx) = mpsc::unbounded();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded();
        let client = Uuid::new_v4();
        let session =
            ClientSession::new(client, pipeline.clone(), CancellationToken::new(), 8);
        let running = tokio::spawn(session.run(inbound_rx, outbound_tx));

        inbound_tx.unbounded_send(frame_event(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(inbound_tx);
        running.await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(outbound_rx.next().await.is_none());
        assert!(pipeline.cache().is_empty());
        assert!(pipeline.admission().last_admitted(&client).is_none());
    }

    #[tokio::test]
    async fn disconnect_cancels_queued_code_scans() {
        let reader = Arc::new(ScriptedCodeReader::slow(vec!["4"], Duration::from_millis(200)));
        let pipeline = FramePipeline::builder(Configuration::default())
            .worker_count(1)
            .detector(Arc::new(ScriptedDetector::new(vec![])))
            .code_reader(reader.clone())
            .build()
            .unwrap();
        let (inbound_tx, inbound_rx) = mpsc::unbounded();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded();
        let session = ClientSession::new(Uuid::new_v4(), pipeline, CancellationToken::new(), 8);
        let running = tokio::spawn(session.run(inbound_rx, outbound_tx));

        for seed in 0..3 {
            inbound_tx.unbounded_send(code_event(seed)).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(inbound_tx);
        running.await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(reader.calls(), 1);
        assert!(outbound_rx.next().await.is_none());
    }
}
