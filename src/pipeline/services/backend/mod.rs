pub mod capabilities;
pub mod labels;
pub mod recognition_service;

pub use capabilities::{
    CodeReader, DecodedCode, Detector, DisabledCodeReader, DisabledDetector, RawDetection,
};
pub use labels::category_label;
pub use recognition_service::{RecognitionOutput, RecognitionPool, RecognitionRequest, RecognitionTask};
