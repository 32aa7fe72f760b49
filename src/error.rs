use thiserror::Error;
use uuid::Uuid;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to bind to port {1}: {0}")]
    Bind(std::io::Error, u16),
    #[error("Server stopped unexpectedly: {0}")]
    Serve(std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to load route table: {0}")]
    RouteTable(String),
    #[error("Client Error: {0}")]
    Client(String),
    #[error("Failed to send shutdown to client handle: {0}")]
    ClientShutdown(Uuid),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
}

/// Failures scoped to a single frame. These never leave the pipeline as
/// errors; they are turned into a rejected outcome for the submitting client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Invalid payload encoding: {0}")]
    PayloadDecode(String),
    #[error("Payload is not a valid image: {0}")]
    ImageDecode(String),
    #[error("Recognition backend failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Frame left the pipeline without a result (stage {0})")]
    Incomplete(String),
}

impl From<base64::DecodeError> for FrameError {
    fn from(err: base64::DecodeError) -> Self {
        FrameError::PayloadDecode(err.to_string())
    }
}

impl From<image::ImageError> for FrameError {
    fn from(err: image::ImageError) -> Self {
        FrameError::ImageDecode(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("detector failed: {0}")]
    Detector(String),
    #[error("code reader failed: {0}")]
    CodeReader(String),
    #[error("worker pool unavailable: {0}")]
    WorkerPool(String),
}
