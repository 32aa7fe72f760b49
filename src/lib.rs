pub mod common;
pub mod config;
pub mod error;
pub mod intake;
pub mod network;
pub mod pipeline;

#[cfg(test)]
mod test_utils;

pub use config::Configuration;
pub use error::{AppError, BackendError, FrameError};
pub use pipeline::{FrameOutcome, FramePipeline};
