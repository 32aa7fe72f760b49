//! Fixtures shared by the unit tests.

use crate::common::BoundingBox;
use crate::error::BackendError;
use crate::pipeline::services::backend::{CodeReader, DecodedCode, Detector, RawDetection};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A `data:` URL carrying a PNG whose pixels depend on `seed`.
pub fn png_payload(width: u32, height: u32, seed: u8) -> String {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x as u8).wrapping_add(seed),
            (y as u8).wrapping_mul(3),
            seed,
        ])
    });
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(bytes.into_inner()))
}

pub struct ScriptedDetector {
    detections: Vec<RawDetection>,
    delay: Duration,
    calls: AtomicUsize,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Blocks the worker thread for `delay` on every call.
    pub fn slow(detections: Vec<RawDetection>, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(detections)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most `infer` calls ever observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Detector for ScriptedDetector {
    fn infer(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(self.detections.clone())
    }
}

pub struct ScriptedCodeReader {
    codes: Vec<DecodedCode>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedCodeReader {
    pub fn new(texts: Vec<&str>) -> Self {
        let codes = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let offset = i as i32 * 20;
                DecodedCode {
                    text: text.to_string(),
                    bbox: BoundingBox::new(offset, 0, offset + 10, 10),
                }
            })
            .collect();
        Self::with_codes(codes)
    }

    pub fn with_codes(codes: Vec<DecodedCode>) -> Self {
        Self {
            codes,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Blocks the worker thread for `delay` on every call.
    pub fn slow(texts: Vec<&str>, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(texts)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CodeReader for ScriptedCodeReader {
    fn scan(&self, _image: &DynamicImage) -> Result<Vec<DecodedCode>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self.codes.clone())
    }
}

pub struct FailingDetector;

impl Detector for FailingDetector {
    fn infer(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>, BackendError> {
        Err(BackendError::Detector("model not loaded".to_string()))
    }
}

/// Blocks for the given time, then fails.
pub struct SlowFailingDetector(pub Duration);

impl Detector for SlowFailingDetector {
    fn infer(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>, BackendError> {
        std::thread::sleep(self.0);
        Err(BackendError::Detector("inference timed out".to_string()))
    }
}

pub fn raw(category: u32, confidence: f32, bbox: [i32; 4]) -> RawDetection {
    RawDetection {
        category,
        confidence,
        bbox: bbox.into(),
    }
}
