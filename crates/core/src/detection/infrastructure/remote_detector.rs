//! Cloud vision service client for attribute-rich face detection.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::attributes::{EmotionScores, Eyewear, FaceAttributes, Gender};
use crate::detection::domain::detection::DetectionResult;
use crate::detection::domain::detector::{DetectError, FaceDetector};
use crate::shared::constants::REMOTE_JPEG_QUALITY;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Attribute categories requested from the service. Landmarks are not.
const REQUESTED_ATTRIBUTES: &str = "age,gender,smile,facialHair,glasses,accessories,emotion";

#[derive(Error, Debug)]
pub enum RemoteDetectError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

impl RemoteDetectError {
    fn class(&self) -> &'static str {
        match self {
            RemoteDetectError::Network(e) if e.is_timeout() => "timeout",
            RemoteDetectError::Network(_) => "network",
            RemoteDetectError::Status { .. } => "status",
            RemoteDetectError::Decode(_) => "decode",
            RemoteDetectError::Encode(_) => "encode",
        }
    }
}

/// Configuration for the remote face-analysis endpoint.
#[derive(Clone, Debug)]
pub struct RemoteDetectorConfig {
    /// Base URL of the face-analysis service.
    pub endpoint: String,
    /// Subscription key sent with every request.
    pub api_key: String,
    /// Upper bound on one detection round trip.
    pub timeout: Duration,
    /// JPEG quality for the uploaded frame.
    pub jpeg_quality: u8,
}

impl Default for RemoteDetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://westus.api.cognitive.microsoft.com/face/v1.0".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
            jpeg_quality: REMOTE_JPEG_QUALITY,
        }
    }
}

/// Remote detection strategy: ships a JPEG-compressed frame to the vision
/// service and maps the response into rectangles plus attributes, index
/// correspondence preserved in response order.
///
/// Every failure mode — network, auth, quota, timeout, malformed payload —
/// degrades to an empty result. The error is logged and the cycle goes on;
/// nothing propagates to the scheduler.
pub struct RemoteFaceDetector {
    http: Client,
    config: RemoteDetectorConfig,
}

impl RemoteFaceDetector {
    pub fn new(config: RemoteDetectorConfig) -> Result<Self, RemoteDetectError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    async fn try_detect(&self, frame: &Frame) -> Result<DetectionResult, RemoteDetectError> {
        let jpeg = encode_jpeg(frame, self.config.jpeg_quality)?;
        let url = format!("{}/detect", self.config.endpoint.trim_end_matches('/'));

        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .query(&[
                ("returnFaceId", "true"),
                ("returnFaceLandmarks", "false"),
                ("returnFaceAttributes", REQUESTED_ATTRIBUTES),
            ])
            .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(jpeg)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteDetectError::Status { status, body });
        }

        let body = response.text().await?;
        let detected: Vec<DetectedFace> = serde_json::from_str(&body)?;
        log::debug!(
            "remote detection: {} face(s) in {:.0}ms",
            detected.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(into_result(detected))
    }
}

#[async_trait]
impl FaceDetector for RemoteFaceDetector {
    async fn detect(&self, frame: &Frame) -> Result<DetectionResult, DetectError> {
        match self.try_detect(frame).await {
            Ok(result) => Ok(result),
            Err(e) => {
                log::warn!(
                    "remote detection failed ({}), treating as zero faces: {e}",
                    e.class()
                );
                Ok(DetectionResult::empty())
            }
        }
    }
}

fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode(
        frame.data(),
        frame.width(),
        frame.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

fn into_result(detected: Vec<DetectedFace>) -> DetectionResult {
    let mut faces = Vec::with_capacity(detected.len());
    let mut attributes = Vec::with_capacity(detected.len());
    for face in detected {
        faces.push(Rect::new(
            face.face_rectangle.left,
            face.face_rectangle.top,
            face.face_rectangle.width,
            face.face_rectangle.height,
        ));
        attributes.push(face.face_attributes.into());
    }
    DetectionResult::with_attributes(faces, attributes)
}

// Wire shapes of the face-analysis response.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectedFace {
    face_rectangle: WireRectangle,
    face_attributes: WireAttributes,
}

#[derive(Debug, Deserialize)]
struct WireRectangle {
    top: i32,
    left: i32,
    width: i32,
    height: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAttributes {
    age: f64,
    gender: Gender,
    #[serde(default)]
    smile: f64,
    #[serde(default)]
    facial_hair: WireFacialHair,
    glasses: Eyewear,
    #[serde(default)]
    accessories: Vec<WireAccessory>,
    #[serde(default)]
    emotion: EmotionScores,
}

#[derive(Debug, Default, Deserialize)]
struct WireFacialHair {
    #[serde(default)]
    beard: f64,
    #[serde(default)]
    moustache: f64,
}

#[derive(Debug, Deserialize)]
struct WireAccessory {
    #[serde(rename = "type")]
    kind: String,
}

impl From<WireAttributes> for FaceAttributes {
    fn from(wire: WireAttributes) -> Self {
        FaceAttributes {
            age: wire.age,
            gender: wire.gender,
            smile: wire.smile,
            beard: wire.facial_hair.beard,
            moustache: wire.facial_hair.moustache,
            eyewear: wire.glasses,
            accessories: wire.accessories.into_iter().map(|a| a.kind).collect(),
            emotions: wire.emotion,
        }
    }
}
