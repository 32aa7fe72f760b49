use crate::common::BoundingBox;
use crate::error::BackendError;
use image::DynamicImage;

/// One region reported by an object detector.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub category: u32,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// One machine-readable code found in an image.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCode {
    pub text: String,
    pub bbox: BoundingBox,
}

/// Object recognition model. Calls may take hundreds of milliseconds and run
/// on blocking worker threads.
pub trait Detector: Send + Sync + 'static {
    fn infer(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, BackendError>;
}

/// Barcode / QR locator and decoder. An empty result is a normal outcome.
pub trait CodeReader: Send + Sync + 'static {
    fn scan(&self, image: &DynamicImage) -> Result<Vec<DecodedCode>, BackendError>;
}

/// Stand-in used when no model is wired into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledDetector;

impl Detector for DisabledDetector {
    fn infer(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>, BackendError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCodeReader;

impl CodeReader for DisabledCodeReader {
    fn scan(&self, _image: &DynamicImage) -> Result<Vec<DecodedCode>, BackendError> {
        Ok(Vec::new())
    }
}
