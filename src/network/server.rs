use crate::config::Configuration;
use crate::error::AppError;
use crate::intake::client::ClientManagerHandle;
use crate::network::handlers;
use crate::pipeline::FramePipeline;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: FramePipeline,
    pub clients: ClientManagerHandle,
}

pub struct Server {
    host: String,
    port: u16,
    state: AppState,
}

impl Server {
    pub fn new(
        configuration: &Configuration,
        pipeline: FramePipeline,
        clients: ClientManagerHandle,
    ) -> Self {
        Self {
            host: configuration.server.host.clone(),
            port: configuration.server.port,
            state: AppState { pipeline, clients },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(handlers::websocket))
            .route("/process-qrcode", post(handlers::process_code_image))
            .route("/health", get(handlers::health))
            .route("/status", get(handlers::status))
            .route("/config", get(handlers::config))
            .route("/routes", get(handlers::routes))
            .with_state(self.state.clone())
    }

    /// Serves until `shutdown` is cancelled.
    pub async fn start(self, shutdown: CancellationToken) -> Result<(), AppError> {
        info!("Starting network server on {}:{}", self.host, self.port);
        let listener = TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| AppError::Bind(e, self.port))?;
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(AppError::Serve)?;
        info!("Network server stopped");
        Ok(())
    }
}
