use crate::common::{CodeScanResult, FrameResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Event sent by a client over the socket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Base64 frame, optionally behind a `data:` header.
    ProcessFrame(String),
    ProcessQrcode(String),
}

impl FromStr for InboundMessage {
    type Err = serde_json::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub error: String,
}

/// Event pushed to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundMessage {
    DetectionResults(FrameResult),
    DetectionError(ErrorReport),
    QrcodeResults(CodeScanResult),
}

impl OutboundMessage {
    pub fn error(error: impl ToString) -> Self {
        OutboundMessage::DetectionError(ErrorReport {
            error: error.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
