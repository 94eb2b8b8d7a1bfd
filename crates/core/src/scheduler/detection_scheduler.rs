use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::Sender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::analytics::aggregator::{aggregate, AggregateStats};
use crate::capture::domain::frame_source::FrameSource;
use crate::detection::domain::detection::DetectionResult;
use crate::detection::domain::detector::FaceDetector;
use crate::scheduler::events::SchedulerEvent;
use crate::scheduler::overlay;
use crate::telemetry::publisher::TelemetryPublisher;

/// Scheduler configuration, fixed for the lifetime of the run.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Time between detection cycles. Whole seconds in production; shorter
    /// values are accepted (tests).
    pub interval: Duration,
    /// Device identifier stamped onto published telemetry.
    pub device_id: String,
    /// Hand completed statistics to the telemetry publisher.
    pub publish_enabled: bool,
    /// Emit the annotated detection image after each completed cycle. When
    /// off, a completed cycle clears the previous overlay instead.
    pub show_detection_preview: bool,
}

/// Observable scheduler state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Capturing,
    Detecting,
    Publishing,
}

/// The periodic driver of the pipeline: snapshot → detect → aggregate →
/// notify → publish, one cycle per timer tick.
///
/// Cycles never overlap: the loop runs each cycle to completion before the
/// interval can yield the next tick, and ticks that elapse mid-cycle are
/// dropped, not queued. A tick whose remote call outlives the run is
/// cancelled on `stop()` and its result discarded.
pub struct DetectionScheduler {
    config: SchedulerConfig,
    source: Arc<dyn FrameSource>,
    detector: Arc<dyn FaceDetector>,
    publisher: Arc<TelemetryPublisher>,
    events: Sender<SchedulerEvent>,
    state: Arc<Mutex<SchedulerState>>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl DetectionScheduler {
    pub fn new(
        config: SchedulerConfig,
        source: Arc<dyn FrameSource>,
        detector: Arc<dyn FaceDetector>,
        publisher: Arc<TelemetryPublisher>,
        events: Sender<SchedulerEvent>,
    ) -> Self {
        Self {
            config,
            source,
            detector,
            publisher,
            events,
            state: Arc::new(Mutex::new(SchedulerState::Idle)),
            cancelled: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Arms the periodic timer and begins running cycles. No-op when
    /// already started. Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        self.cancelled.store(false, Ordering::Release);
        set_state(&self.state, SchedulerState::Capturing);
        log::info!(
            "detection scheduler started (interval {:?}, publish {}, preview {})",
            self.config.interval,
            self.config.publish_enabled,
            self.config.show_detection_preview
        );

        let runner = CycleRunner {
            config: self.config.clone(),
            source: Arc::clone(&self.source),
            detector: Arc::clone(&self.detector),
            publisher: Arc::clone(&self.publisher),
            events: self.events.clone(),
            state: Arc::clone(&self.state),
            cancelled: Arc::clone(&self.cancelled),
        };
        let period = self.config.interval;

        self.worker = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            // a tick elapsing while a cycle is in flight is dropped, never queued
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if runner.cancelled.load(Ordering::Acquire) {
                    break;
                }
                runner.run_cycle().await;
            }
        }));
    }

    /// Disarms the timer and clears live overlay state. An in-flight cycle
    /// is cancelled and its result discarded rather than applied late.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.cancelled.store(true, Ordering::Release);
        worker.abort();
        set_state(&self.state, SchedulerState::Idle);
        let _ = self.events.send(SchedulerEvent::OverlayCleared);
        log::info!("detection scheduler stopped");
    }
}

impl Drop for DetectionScheduler {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.cancelled.store(true, Ordering::Release);
            worker.abort();
        }
    }
}

struct CycleRunner {
    config: SchedulerConfig,
    source: Arc<dyn FrameSource>,
    detector: Arc<dyn FaceDetector>,
    publisher: Arc<TelemetryPublisher>,
    events: Sender<SchedulerEvent>,
    state: Arc<Mutex<SchedulerState>>,
    cancelled: Arc<AtomicBool>,
}

impl CycleRunner {
    async fn run_cycle(&self) {
        // Feed not running or no frame yet: skip the whole cycle. Nothing is
        // emitted and the previous overlay stays as it was.
        if !self.source.is_capturing() {
            log::debug!("cycle skipped: source is not capturing");
            return;
        }
        let Some(frame) = self.source.snapshot() else {
            log::debug!("cycle skipped: no frame available");
            return;
        };

        set_state(&self.state, SchedulerState::Detecting);
        let result = match self.detector.detect(&frame).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("detection failed, degrading to zero faces: {e}");
                DetectionResult::empty()
            }
        };

        // Superseded by stop() while the detector was in flight: discard.
        if self.cancelled.load(Ordering::Acquire) {
            return;
        }

        let stats = aggregate(&result);
        log::debug!(
            "cycle (frame {}): {} person(s)",
            frame.seq(),
            stats.person_count
        );
        let _ = self.events.send(SchedulerEvent::Stats(stats.clone()));

        if self.config.show_detection_preview {
            let annotated = overlay::draw_detections(&frame, &result);
            let _ = self.events.send(SchedulerEvent::Overlay(Arc::new(annotated)));
        } else {
            let _ = self.events.send(SchedulerEvent::OverlayCleared);
        }

        set_state(&self.state, SchedulerState::Publishing);
        if self.config.publish_enabled {
            self.publish(&stats);
        }
        set_state(&self.state, SchedulerState::Capturing);
    }

    fn publish(&self, stats: &AggregateStats) {
        self.publisher.publish(stats, &self.config.device_id);
    }
}

fn set_state(state: &Mutex<SchedulerState>, next: SchedulerState) {
    *state.lock().unwrap_or_else(|p| p.into_inner()) = next;
}
