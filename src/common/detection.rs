use crate::common::route::RouteRecord;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates, serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Maps a box from a resized frame back onto the original frame.
    pub fn scaled(self, scale: Scale) -> Self {
        if scale.is_identity() {
            return self;
        }
        let along = |v: i32, factor: f32| (v as f32 * factor).round() as i32;
        Self {
            x1: along(self.x1, scale.x),
            y1: along(self.y1, scale.y),
            x2: along(self.x2, scale.x),
            y2: along(self.y2, scale.y),
        }
    }
}

/// Per-axis factors from resized-frame coordinates to submitted-frame
/// coordinates. Rounding during a resize makes the two axes differ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Scale {
    pub const IDENTITY: Scale = Scale { x: 1.0, y: 1.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn uniform(factor: f32) -> Self {
        Self::new(factor, factor)
    }

    pub fn is_identity(&self) -> bool {
        (self.x - 1.0).abs() < f32::EPSILON && (self.y - 1.0).abs() < f32::EPSILON
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.x1, bbox.y1, bbox.x2, bbox.y2]
    }
}

pub const CODE_CONFIDENCE: f32 = 1.0;

/// One recognized region of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Detection {
    Object {
        label: String,
        category: u32,
        confidence: f32,
        #[serde(rename = "box")]
        bbox: BoundingBox,
    },
    Code {
        #[serde(rename = "qr_data")]
        raw_code: String,
        bus_info: RouteRecord,
        confidence: f32,
        #[serde(rename = "box")]
        bbox: BoundingBox,
    },
}

impl Detection {
    pub fn code(raw_code: String, route: RouteRecord, bbox: BoundingBox) -> Self {
        Detection::Code {
            raw_code,
            bus_info: route,
            confidence: CODE_CONFIDENCE,
            bbox,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        match self {
            Detection::Object { bbox, .. } | Detection::Code { bbox, .. } => *bbox,
        }
    }

    pub fn confidence(&self) -> f32 {
        match self {
            Detection::Object { confidence, .. } | Detection::Code { confidence, .. } => {
                *confidence
            }
        }
    }
}

/// Unit stored in the result cache and returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub detections: Vec<Detection>,
    /// Seconds spent producing the result on the miss path.
    pub processing_time: f64,
    /// Unix milliseconds at which the result was produced.
    pub timestamp: i64,
}

/// One decoded code returned by the code-image scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeScanEntry {
    pub qr_data: String,
    pub bus_info: RouteRecord,
    /// Top-level alias of `bus_info` kept for clients that read it directly.
    pub route: RouteRecord,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CodeScanResult {
    NotFound {
        qr_codes_found: bool,
        message: String,
    },
    Found {
        qr_codes_found: bool,
        count: usize,
        results: Vec<CodeScanEntry>,
    },
}

impl CodeScanResult {
    pub fn not_found() -> Self {
        CodeScanResult::NotFound {
            qr_codes_found: false,
            message: "Nenhum QR code encontrado na imagem".to_string(),
        }
    }

    pub fn found(results: Vec<CodeScanEntry>) -> Self {
        if results.is_empty() {
            return Self::not_found();
        }
        CodeScanResult::Found {
            qr_codes_found: true,
            count: results.len(),
            results,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, CodeScanResult::Found { .. })
    }
}
