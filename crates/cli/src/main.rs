use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::Receiver;

use standwatch_core::capture::domain::frame_source::FrameSource;
use standwatch_core::capture::infrastructure::camera_source::CameraFrameSource;
use standwatch_core::detection::domain::detector::{DetectorKind, FaceDetector};
use standwatch_core::detection::infrastructure::cascade_detector::{
    Acceleration, CascadeFaceDetector,
};
use standwatch_core::detection::infrastructure::remote_detector::{
    RemoteDetectorConfig, RemoteFaceDetector,
};
use standwatch_core::scheduler::detection_scheduler::{DetectionScheduler, SchedulerConfig};
use standwatch_core::scheduler::events::{event_channel, SchedulerEvent};
use standwatch_core::shared::constants::MIN_DETECTION_INTERVAL_SECS;
use standwatch_core::shared::frame::Frame;
use standwatch_core::telemetry::publisher::TelemetryPublisher;
use standwatch_core::telemetry::sink::{
    HttpTelemetrySink, NullTelemetrySink, TelemetrySink, TelemetrySinkConfig,
};

mod settings;

use settings::Settings;

/// Crowd detection and analytics for a fixed observation stand.
#[derive(Parser)]
#[command(name = "standwatch")]
struct Cli {
    /// Settings file (JSON). Defaults to the platform config location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera device id (0 = built-in or first USB camera).
    #[arg(long)]
    camera: Option<i32>,

    /// Seconds between detection cycles.
    #[arg(long)]
    interval: Option<u64>,

    /// Detection strategy: local or remote.
    #[arg(long)]
    detector: Option<String>,

    /// Directory containing the face and eye cascade model files.
    #[arg(long)]
    cascade_dir: Option<PathBuf>,

    /// Remote face-analysis endpoint base URL.
    #[arg(long)]
    remote_endpoint: Option<String>,

    /// Remote face-analysis subscription key (or STANDWATCH_FACE_API_KEY).
    #[arg(long)]
    face_api_key: Option<String>,

    /// Telemetry ingestion endpoint base URL.
    #[arg(long)]
    telemetry_endpoint: Option<String>,

    /// Telemetry shared-access key (or STANDWATCH_TELEMETRY_KEY).
    #[arg(long)]
    telemetry_key: Option<String>,

    /// Telemetry device identifier.
    #[arg(long)]
    device_id: Option<String>,

    /// Publish crowd statistics to the telemetry endpoint.
    #[arg(long)]
    publish: bool,

    /// Log raw preview frames at capture rate.
    #[arg(long)]
    camera_preview: bool,

    /// Force the CPU cascade path even when OpenCL is available.
    #[arg(long)]
    no_accel: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = apply_overrides(Settings::load(cli.config.as_deref())?, &cli);
    if let Some(value) = cli.detector.as_deref() {
        settings.detector = parse_detector(value)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_pipeline(settings, &cli))
}

fn apply_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(camera) = cli.camera {
        settings.camera_id = camera;
    }
    if let Some(interval) = cli.interval {
        settings.interval_secs = interval;
    }
    if let Some(dir) = &cli.cascade_dir {
        settings.cascade_dir = dir.clone();
    }
    if let Some(endpoint) = &cli.remote_endpoint {
        settings.remote_endpoint = endpoint.clone();
    }
    if let Some(endpoint) = &cli.telemetry_endpoint {
        settings.telemetry_endpoint = endpoint.clone();
    }
    if let Some(device_id) = &cli.device_id {
        settings.device_id = device_id.clone();
    }
    if cli.publish {
        settings.publish_telemetry = true;
    }
    if cli.camera_preview {
        settings.show_camera_preview = true;
    }
    settings
}

async fn run_pipeline(settings: Settings, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let detector = build_detector(&settings, cli)?;
    let publisher = Arc::new(TelemetryPublisher::new(build_sink(&settings, cli)?));

    let (preview_tx, preview_rx) = crossbeam_channel::unbounded();
    let preview_tap = settings.show_camera_preview.then_some(preview_tx);
    let source = Arc::new(CameraFrameSource::open(settings.camera_id, preview_tap)?);

    let (event_tx, event_rx) = event_channel();
    let mut scheduler = DetectionScheduler::new(
        SchedulerConfig {
            interval: Duration::from_secs(
                settings.interval_secs.max(MIN_DETECTION_INTERVAL_SECS),
            ),
            device_id: settings.device_id.clone(),
            publish_enabled: settings.publish_telemetry,
            show_detection_preview: settings.show_detection_preview,
        },
        Arc::clone(&source) as Arc<dyn FrameSource>,
        detector,
        publisher,
        event_tx,
    );

    spawn_event_drain(event_rx, settings.show_camera_preview.then_some(preview_rx));

    source.start();
    scheduler.start();
    log::info!(
        "standwatch running on camera {} ({} strategy, every {}s); ctrl-c to stop",
        settings.camera_id,
        settings.detector,
        settings.interval_secs.max(MIN_DETECTION_INTERVAL_SECS)
    );

    tokio::signal::ctrl_c().await?;
    log::info!("shutting down");
    scheduler.stop();
    source.stop();
    Ok(())
}

fn build_detector(
    settings: &Settings,
    cli: &Cli,
) -> Result<Arc<dyn FaceDetector>, Box<dyn std::error::Error>> {
    match settings.detector {
        DetectorKind::Local => {
            let acceleration = if cli.no_accel {
                Acceleration::Cpu
            } else {
                Acceleration::Auto
            };
            let detector = CascadeFaceDetector::new(
                &settings.face_cascade_path(),
                &settings.eye_cascade_path(),
                acceleration,
            )?;
            Ok(Arc::new(detector))
        }
        DetectorKind::Remote => {
            let api_key = secret(cli.face_api_key.as_deref(), "STANDWATCH_FACE_API_KEY")
                .ok_or("remote detector selected but no API key configured")?;
            let detector = RemoteFaceDetector::new(RemoteDetectorConfig {
                endpoint: settings.remote_endpoint.clone(),
                api_key,
                ..RemoteDetectorConfig::default()
            })?;
            Ok(Arc::new(detector))
        }
    }
}

fn build_sink(
    settings: &Settings,
    cli: &Cli,
) -> Result<Arc<dyn TelemetrySink>, Box<dyn std::error::Error>> {
    if !settings.publish_telemetry {
        return Ok(Arc::new(NullTelemetrySink));
    }
    if settings.telemetry_endpoint.is_empty() {
        return Err("telemetry publishing enabled but no endpoint configured".into());
    }
    let access_key = secret(cli.telemetry_key.as_deref(), "STANDWATCH_TELEMETRY_KEY")
        .ok_or("telemetry publishing enabled but no access key configured")?;
    let sink = HttpTelemetrySink::new(TelemetrySinkConfig {
        endpoint: settings.telemetry_endpoint.clone(),
        access_key,
        timeout: Duration::from_secs(10),
    })?;
    Ok(Arc::new(sink))
}

fn parse_detector(value: &str) -> Result<DetectorKind, String> {
    match value {
        "local" => Ok(DetectorKind::Local),
        "remote" => Ok(DetectorKind::Remote),
        other => Err(format!("unknown detector '{other}' (expected local or remote)")),
    }
}

fn secret(flag: Option<&str>, env_var: &str) -> Option<String> {
    flag.map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .filter(|s| !s.is_empty())
}

/// Drains pipeline events onto the log; this binary's stand-in for a
/// presentation layer.
fn spawn_event_drain(
    events: Receiver<SchedulerEvent>,
    preview: Option<Receiver<Arc<Frame>>>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut preview = preview.unwrap_or_else(crossbeam_channel::never);
        loop {
            crossbeam_channel::select! {
                recv(events) -> msg => match msg {
                    Ok(event) => log_event(&event),
                    Err(_) => break,
                },
                recv(preview) -> msg => match msg {
                    Ok(frame) => log::trace!(
                        "preview frame {} ({}x{})",
                        frame.seq(),
                        frame.width(),
                        frame.height()
                    ),
                    // capture ended; keep draining scheduler events
                    Err(_) => preview = crossbeam_channel::never(),
                },
            }
        }
    })
}

fn log_event(event: &SchedulerEvent) {
    match event {
        SchedulerEvent::Stats(stats) => log::info!(
            "{} person(s) in view (male {}, female {}, smiling {}, avg age {:.1}, happy {:.2}%)",
            stats.person_count,
            stats.male_count,
            stats.female_count,
            stats.smile_count,
            stats.age_average,
            stats.happy_ratio
        ),
        SchedulerEvent::Overlay(frame) => log::debug!(
            "detection overlay updated (frame {}, {}x{})",
            frame.seq(),
            frame.width(),
            frame.height()
        ),
        SchedulerEvent::OverlayCleared => log::debug!("detection overlay cleared"),
    }
}
