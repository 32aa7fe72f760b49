pub mod frame_context;
pub mod instrumented_step;
pub mod processing_step;

pub use frame_context::{FrameContext, FrameMetrics, FrameRequest, FrameStage};
pub use instrumented_step::{InstrumentedStep, StepInstrumentation};
pub use processing_step::{ProcessingStep, StepFlow};
