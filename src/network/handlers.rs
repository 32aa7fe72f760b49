use crate::common::{CodeScanResult, RouteRecord};
use crate::intake::client::ClientSession;
use crate::network::message::{ErrorReport, OutboundMessage};
use crate::network::server::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::Utc;
use futures::{future, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

type ErrorResponse = (StatusCode, Json<ErrorReport>);

fn error_response(status: StatusCode, error: impl ToString) -> ErrorResponse {
    (
        status,
        Json(ErrorReport {
            error: error.to_string(),
        }),
    )
}

pub async fn websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(socket: WebSocket, state: AppState) {
    let (client_id, cancel) = match state.clients.connect().await {
        Ok(registration) => registration,
        Err(e) => {
            error!("Could not register session: {}", e);
            return;
        }
    };

    let (sender, receiver) = socket.split();
    let inbound = Box::pin(
        receiver
            .take_while(|message| {
                future::ready(!matches!(message, Ok(Message::Close(_)) | Err(_)))
            })
            .filter_map(|message| {
                future::ready(match message {
                    Ok(Message::Text(text)) => Some(text.as_str().to_owned()),
                    _ => None,
                })
            }),
    );
    let outbound = Box::pin(sender.with(|reply: OutboundMessage| {
        future::ready(
            reply
                .to_json()
                .map(|json| Message::Text(json.into()))
                .map_err(axum::Error::new),
        )
    }));

    let max_in_flight = state.pipeline.configuration().max_in_flight_frames;
    ClientSession::new(client_id, state.pipeline.clone(), cancel, max_in_flight)
        .run(inbound, outbound)
        .await;

    if let Err(e) = state.clients.disconnect(client_id).await {
        warn!("Session {:?} ended after the supervisor stopped: {}", client_id, e);
    }
}

#[derive(Debug, Deserialize)]
pub struct CodeImageRequest {
    pub image: String,
}

pub async fn process_code_image(
    State(state): State<AppState>,
    Json(request): Json<CodeImageRequest>,
) -> Result<Json<CodeScanResult>, ErrorResponse> {
    state
        .pipeline
        .code_scanner()
        .scan(&request.image)
        .await
        .map(Json)
        .map_err(|e| {
            debug!("Code image rejected: {}", e);
            error_response(StatusCode::BAD_REQUEST, e)
        })
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub connected_clients: usize,
    pub rate_limited_clients: usize,
    pub cache_size: usize,
    pub cache_capacity: usize,
}

pub async fn status(State(state): State<AppState>) -> Result<Json<StatusReport>, ErrorResponse> {
    let clients = state
        .clients
        .list_clients()
        .await
        .map_err(|e| error_response(StatusCode::SERVICE_UNAVAILABLE, e))?;
    let cache = state.pipeline.cache();
    Ok(Json(StatusReport {
        connected_clients: clients.len(),
        rate_limited_clients: state.pipeline.admission().tracked_clients(),
        cache_size: cache.len(),
        cache_capacity: cache.capacity(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub min_request_interval: f64,
    pub cache_capacity: usize,
    pub worker_count: usize,
    pub confidence_threshold: f32,
    pub max_dimension: u32,
    pub allowed_categories: Vec<u32>,
}

pub async fn config(State(state): State<AppState>) -> Json<ConfigReport> {
    let pipeline = &state.pipeline;
    let configuration = pipeline.configuration();
    Json(ConfigReport {
        min_request_interval: pipeline.admission().min_interval().as_secs_f64(),
        cache_capacity: pipeline.cache().capacity(),
        worker_count: pipeline.worker_count(),
        confidence_threshold: configuration.detection.confidence_threshold,
        max_dimension: configuration.detection.max_dimension,
        allowed_categories: configuration.detection.allowed_categories.clone(),
    })
}

pub async fn routes(State(state): State<AppState>) -> Json<Vec<RouteRecord>> {
    Json(state.pipeline.routes().all())
}
