use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::detection::domain::detection::DetectionResult;
use crate::shared::frame::Frame;

pub type DetectError = Box<dyn std::error::Error + Send + Sync>;

/// Domain interface for face detection over a single frame.
///
/// Both strategies satisfy it: the local cascade blocks for the duration of
/// classification (run it on a blocking-capable executor), the remote one
/// suspends at the network call. Zero faces is the ordinary empty result,
/// not an error; implementations that recover from their own failures (the
/// remote strategy does) return `Ok` with an empty result instead of `Err`.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(&self, frame: &Frame) -> Result<DetectionResult, DetectError>;
}

/// Runtime capability switch for the active detection strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// On-device cascade classifier: always available, rectangles only.
    Local,
    /// Cloud vision service: network-dependent, rectangles plus attributes.
    Remote,
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorKind::Local => write!(f, "local"),
            DetectorKind::Remote => write!(f, "remote"),
        }
    }
}
