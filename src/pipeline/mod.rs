pub mod code_scan;
pub mod orchestration;
pub mod pipeline;
pub mod services;

pub use code_scan::CodeScanner;
pub use orchestration::{FrameRequest, FrameStage};
pub use pipeline::{FrameOutcome, FramePipeline, FramePipelineBuilder};
