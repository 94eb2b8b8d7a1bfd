use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use opencv::core::{AlgorithmHint, Mat};
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use thiserror::Error;

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to open camera device {device}: {source}")]
    DeviceOpen {
        device: i32,
        #[source]
        source: opencv::Error,
    },
    #[error("camera device {0} is not available")]
    DeviceUnavailable(i32),
}

/// One grab from the underlying device.
///
/// `Ok(None)` is a transient empty read (skip quietly); `Err` is device
/// loss and ends acquisition.
trait FrameGrabber: Send {
    fn grab(&mut self, seq: u64) -> Result<Option<Frame>, opencv::Error>;
}

/// Grabber over an OpenCV `VideoCapture`, converting BGR to RGB at this
/// boundary.
struct CameraGrabber {
    capture: VideoCapture,
    bgr: Mat,
}

impl FrameGrabber for CameraGrabber {
    fn grab(&mut self, seq: u64) -> Result<Option<Frame>, opencv::Error> {
        if !self.capture.read(&mut self.bgr)? || self.bgr.empty() {
            return Ok(None);
        }
        let mut rgb = Mat::default();
        imgproc::cvt_color(
            &self.bgr,
            &mut rgb,
            imgproc::COLOR_BGR2RGB,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;
        let data = rgb.data_bytes()?.to_vec();
        Ok(Some(Frame::new(
            data,
            rgb.cols() as u32,
            rgb.rows() as u32,
            3,
            seq,
        )))
    }
}

struct Inner {
    /// Present while stopped; moves into the capture thread on `start` and
    /// comes back through the thread's join handle on `stop`.
    capture: Option<VideoCapture>,
    worker: Option<JoinHandle<VideoCapture>>,
}

/// Camera-backed frame source.
///
/// A dedicated thread reads frames from the driver and swaps them into the
/// single latest-frame slot. The slot holds an `Arc`, so readers take a
/// cheap clone of the handle, the writer replaces it, and neither ever
/// waits on the other. No backlog is kept: latest wins.
pub struct CameraFrameSource {
    device_id: i32,
    inner: Mutex<Inner>,
    latest: Arc<Mutex<Option<Arc<Frame>>>>,
    running: Arc<AtomicBool>,
    preview_tap: Option<Sender<Arc<Frame>>>,
}

impl CameraFrameSource {
    /// Opens the camera device. Failure here is fatal: no device, no source.
    ///
    /// `preview_tap` receives every captured frame at capture rate (for a
    /// live preview); pass `None` when no capture-rate consumer exists. A
    /// disconnected tap receiver never stops capture.
    pub fn open(
        device_id: i32,
        preview_tap: Option<Sender<Arc<Frame>>>,
    ) -> Result<Self, CaptureError> {
        let capture = VideoCapture::new(device_id, videoio::CAP_ANY).map_err(|source| {
            CaptureError::DeviceOpen {
                device: device_id,
                source,
            }
        })?;
        let opened = capture
            .is_opened()
            .map_err(|source| CaptureError::DeviceOpen {
                device: device_id,
                source,
            })?;
        if !opened {
            return Err(CaptureError::DeviceUnavailable(device_id));
        }

        Ok(Self {
            device_id,
            inner: Mutex::new(Inner {
                capture: Some(capture),
                worker: None,
            }),
            latest: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            preview_tap,
        })
    }
}

impl FrameSource for CameraFrameSource {
    fn start(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if inner.worker.is_some() {
            return;
        }
        let Some(capture) = inner.capture.take() else {
            return;
        };

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let latest = Arc::clone(&self.latest);
        let tap = self.preview_tap.clone();
        let device_id = self.device_id;

        inner.worker = Some(std::thread::spawn(move || {
            let grabber = CameraGrabber {
                capture,
                bgr: Mat::default(),
            };
            run_capture_loop(grabber, device_id, &running, &latest, tap.as_ref()).capture
        }));
        log::debug!("camera {}: capture started", self.device_id);
    }

    fn stop(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let Some(worker) = inner.worker.take() else {
            return;
        };
        self.running.store(false, Ordering::Release);
        if let Ok(capture) = worker.join() {
            inner.capture = Some(capture);
        }
        *self.latest.lock().unwrap_or_else(|p| p.into_inner()) = None;
        log::debug!("camera {}: capture stopped", self.device_id);
    }

    fn snapshot(&self) -> Option<Arc<Frame>> {
        if !self.is_capturing() {
            return None;
        }
        self.latest
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn is_capturing(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for CameraFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reads frames until stopped or the device is lost.
///
/// Device loss is terminal for the loop: the slot is cleared, `snapshot`
/// returns `None` from then on, and no reopen is attempted here — retry
/// policy belongs to the caller.
fn run_capture_loop<G: FrameGrabber>(
    mut grabber: G,
    device_id: i32,
    running: &AtomicBool,
    latest: &Mutex<Option<Arc<Frame>>>,
    tap: Option<&Sender<Arc<Frame>>>,
) -> G {
    let mut seq: u64 = 0;

    while running.load(Ordering::Acquire) {
        match grabber.grab(seq) {
            Ok(Some(frame)) => {
                let frame = Arc::new(frame);
                *latest.lock().unwrap_or_else(|p| p.into_inner()) = Some(Arc::clone(&frame));
                if let Some(tx) = tap {
                    let _ = tx.send(frame);
                }
                seq += 1;
            }
            Ok(None) => {
                // transient empty grab; skip without noise
            }
            Err(e) => {
                log::error!("camera {device_id}: device lost ({e}); frames stop here");
                *latest.lock().unwrap_or_else(|p| p.into_inner()) = None;
                break;
            }
        }
    }
    grabber
}
