use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use opencv::core::{self, AlgorithmHint, Mat, Size, ToInputArray, UMat, Vector};
use opencv::imgproc;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use thiserror::Error;

use crate::detection::domain::detection::DetectionResult;
use crate::detection::domain::detector::{DetectError, FaceDetector};
use crate::shared::constants::{CASCADE_MIN_NEIGHBORS, CASCADE_MIN_SIZE, CASCADE_SCALE_FACTOR};
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("failed to load cascade model {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: opencv::Error,
    },
    #[error("cascade model {0} is empty or malformed")]
    EmptyModel(PathBuf),
    #[error("opencv failure: {0}")]
    OpenCv(#[from] opencv::Error),
}

/// Compute backend preference for the cascade pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acceleration {
    /// Use OpenCL through the transparent API when the platform has it.
    Auto,
    /// Plain CPU path regardless of platform support.
    Cpu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    OpenCl,
    Cpu,
}

struct Classifiers {
    face: CascadeClassifier,
    eye: CascadeClassifier,
}

/// Two-stage cascade face detector: face regions first, then eye regions
/// within each face, all on a grayscale, histogram-equalized copy of the
/// frame.
///
/// The OpenCL and CPU paths run the identical pipeline; acceleration is a
/// performance choice, not a contract change. Never populates attributes.
pub struct CascadeFaceDetector {
    classifiers: Arc<Mutex<Classifiers>>,
    backend: Backend,
}

impl CascadeFaceDetector {
    /// Loads both cascade models and picks the compute backend.
    ///
    /// Unreadable or malformed model files fail here, at construction; the
    /// per-frame path does not revalidate them.
    pub fn new(
        face_cascade: &Path,
        eye_cascade: &Path,
        acceleration: Acceleration,
    ) -> Result<Self, CascadeError> {
        let face = load_cascade(face_cascade)?;
        let eye = load_cascade(eye_cascade)?;

        let backend = match acceleration {
            Acceleration::Auto if core::have_opencl()? => {
                core::set_use_opencl(true)?;
                log::info!("Using OpenCL backend for cascade detection");
                Backend::OpenCl
            }
            Acceleration::Auto => {
                log::info!("No OpenCL platform available, using CPU backend for cascade detection");
                Backend::Cpu
            }
            Acceleration::Cpu => {
                log::info!("Using CPU backend for cascade detection");
                Backend::Cpu
            }
        };

        Ok(Self {
            classifiers: Arc::new(Mutex::new(Classifiers { face, eye })),
            backend,
        })
    }

    /// Synchronous classification; blocks the calling thread until done.
    pub fn detect_blocking(&self, frame: &Frame) -> Result<DetectionResult, CascadeError> {
        let started = Instant::now();
        let mut guard = self
            .classifiers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let rgb = Mat::from_slice(frame.data())?;
        let rgb = rgb.reshape(frame.channels() as i32, frame.height() as i32)?;

        let result = match self.backend {
            Backend::OpenCl => detect_umat(&mut guard, &rgb)?,
            Backend::Cpu => detect_mat(&mut guard, &rgb)?,
        };

        log::debug!(
            "cascade detection: {} face(s), {} eye(s) in {:.1}ms",
            result.faces.len(),
            result.eyes.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(result)
    }
}

#[async_trait]
impl FaceDetector for CascadeFaceDetector {
    async fn detect(&self, frame: &Frame) -> Result<DetectionResult, DetectError> {
        // Classification is CPU-bound; keep it off the async worker threads.
        let detector = Self {
            classifiers: Arc::clone(&self.classifiers),
            backend: self.backend,
        };
        let frame = frame.clone();
        let result =
            tokio::task::spawn_blocking(move || detector.detect_blocking(&frame)).await??;
        Ok(result)
    }
}

fn load_cascade(path: &Path) -> Result<CascadeClassifier, CascadeError> {
    let cascade = CascadeClassifier::new(&path.to_string_lossy()).map_err(|source| {
        CascadeError::ModelLoad {
            path: path.to_path_buf(),
            source,
        }
    })?;
    if cascade.empty()? {
        return Err(CascadeError::EmptyModel(path.to_path_buf()));
    }
    Ok(cascade)
}

fn detect_mat(
    classifiers: &mut Classifiers,
    rgb: &impl ToInputArray,
) -> Result<DetectionResult, opencv::Error> {
    let mut gray = Mat::default();
    imgproc::cvt_color(
        rgb,
        &mut gray,
        imgproc::COLOR_RGB2GRAY,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;
    let mut equalized = Mat::default();
    imgproc::equalize_hist(&gray, &mut equalized)?;

    let faces = run_cascade(&mut classifiers.face, &equalized)?;
    let mut eyes = Vec::new();
    for face in &faces {
        let roi = Mat::roi(&equalized, to_cv_rect(face))?;
        for eye in run_cascade(&mut classifiers.eye, &roi)? {
            eyes.push(eye.offset(face.x, face.y));
        }
    }
    Ok(DetectionResult::from_rects(faces, eyes))
}

fn detect_umat(
    classifiers: &mut Classifiers,
    rgb: &impl ToInputArray,
) -> Result<DetectionResult, opencv::Error> {
    let mut gray = UMat::new_def();
    imgproc::cvt_color(
        rgb,
        &mut gray,
        imgproc::COLOR_RGB2GRAY,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;
    let mut equalized = UMat::new_def();
    imgproc::equalize_hist(&gray, &mut equalized)?;

    let faces = run_cascade(&mut classifiers.face, &equalized)?;
    let mut eyes = Vec::new();
    for face in &faces {
        let roi = UMat::roi(&equalized, to_cv_rect(face))?;
        for eye in run_cascade(&mut classifiers.eye, &roi)? {
            eyes.push(eye.offset(face.x, face.y));
        }
    }
    Ok(DetectionResult::from_rects(faces, eyes))
}

fn run_cascade(
    cascade: &mut CascadeClassifier,
    image: &impl ToInputArray,
) -> Result<Vec<Rect>, opencv::Error> {
    let mut found = Vector::<core::Rect>::new();
    cascade.detect_multi_scale(
        image,
        &mut found,
        CASCADE_SCALE_FACTOR,
        CASCADE_MIN_NEIGHBORS,
        0,
        Size::new(CASCADE_MIN_SIZE, CASCADE_MIN_SIZE),
        Size::default(),
    )?;
    Ok(found
        .iter()
        .map(|r| Rect::new(r.x, r.y, r.width, r.height))
        .collect())
}

fn to_cv_rect(rect: &Rect) -> core::Rect {
    core::Rect::new(rect.x, rect.y, rect.width, rect.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file_is_a_construction_error() {
        let err = CascadeFaceDetector::new(
            Path::new("/nonexistent/face.xml"),
            Path::new("/nonexistent/eye.xml"),
            Acceleration::Cpu,
        )
        .unwrap_err();
        match err {
            CascadeError::ModelLoad { path, .. } | CascadeError::EmptyModel(path) => {
                assert!(path.to_string_lossy().contains("face.xml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
