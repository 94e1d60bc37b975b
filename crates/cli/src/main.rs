use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use clap::Parser;

use presence_core::capture::domain::camera_source::CameraSource;
use presence_core::capture::infrastructure::ffmpeg_camera::{CameraSpec, FfmpegCamera};
use presence_core::detection::domain::face_classifier::{FaceClassifier, RegionFaceClassifier};
use presence_core::detection::infrastructure::model_resolver;
use presence_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_CONFIDENCE,
};
use presence_core::pipeline::monitor_logger::LogMonitorLogger;
use presence_core::pipeline::presence_monitor::{MonitorConfig, PresenceMonitor};
use presence_core::presence::domain::signal::{ErrorReason, Signal};
use presence_core::presence::domain::signal_sink::SignalSink;
use presence_core::presence::infrastructure::line_signal_writer::LineSignalWriter;
use presence_core::shared::clock::SystemClock;
use presence_core::shared::constants::{
    DEFAULT_CAMERA_DEVICE, DEFAULT_CAMERA_FORMAT, DEFAULT_MIN_FACE_SIZE, YOLO_MODEL_NAME,
    YOLO_MODEL_URL,
};

/// Watches a camera and reports on stdout whether a face is in view.
///
/// Output is one line per event: READY, FACE_DETECTED, FACE_LOST or
/// ERROR:<reason>. Diagnostics go to stderr and are controlled by RUST_LOG.
#[derive(Parser, Debug)]
#[command(name = "presence-monitor")]
struct Cli {
    /// Capture device passed to libavdevice.
    #[arg(long, default_value = DEFAULT_CAMERA_DEVICE)]
    device: String,

    /// libavdevice input format for --device.
    #[arg(long, default_value = DEFAULT_CAMERA_FORMAT)]
    input_format: String,

    /// Read frames from a video file instead of a live device.
    #[arg(long, conflicts_with_all = ["device", "input_format"])]
    file: Option<PathBuf>,

    /// ONNX face model (downloaded to the cache directory if omitted).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Smallest face width and height, in pixels, that counts as present.
    #[arg(long, default_value_t = DEFAULT_MIN_FACE_SIZE)]
    min_face_size: u32,

    /// Seconds of continuous absence before FACE_LOST.
    #[arg(long, default_value_t = 3.0)]
    absence_threshold: f64,

    /// Pause between samples, in milliseconds.
    #[arg(long, default_value_t = 100)]
    poll_interval_ms: u64,
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
    validate(&cli)?;
    let config = monitor_config(&cli)?;

    let mut sink = LineSignalWriter::stdout();
    let mut camera = open_camera(&cli, &mut sink)?;
    let classifier = match load_classifier(&cli, &mut sink) {
        Ok(classifier) => classifier,
        Err(e) => {
            camera.release();
            return Err(e);
        }
    };

    let monitor = PresenceMonitor::new(
        Box::new(camera),
        classifier,
        Box::new(sink),
        Box::new(SystemClock),
        Box::new(LogMonitorLogger::default()),
        config,
    );
    Err(monitor.run().into())
}

/// Opens the capture source; on failure reports `ERROR:CAMERA_FAIL` on `sink`.
fn open_camera(
    cli: &Cli,
    sink: &mut impl SignalSink,
) -> Result<FfmpegCamera, Box<dyn std::error::Error>> {
    FfmpegCamera::open(&camera_spec(cli)).map_err(|e| {
        report(sink, ErrorReason::CameraFail);
        e.into()
    })
}

/// Loads the face model; on failure reports `ERROR:DETECTOR_FAIL` on `sink`.
fn load_classifier(
    cli: &Cli,
    sink: &mut impl SignalSink,
) -> Result<Box<dyn FaceClassifier>, Box<dyn std::error::Error>> {
    build_classifier(cli).map_err(|e| {
        report(sink, ErrorReason::DetectorFail);
        e
    })
}

/// Best-effort terminal signal for failures before the monitor starts.
fn report(sink: &mut impl SignalSink, reason: ErrorReason) {
    let signal = Signal::Error(reason);
    if let Err(e) = sink.emit(&signal) {
        log::error!("Could not report {signal}: {e}");
    }
}

fn camera_spec(cli: &Cli) -> CameraSpec {
    match &cli.file {
        Some(path) => CameraSpec::file(path.to_string_lossy()),
        None => CameraSpec::device(cli.device.as_str(), cli.input_format.as_str()),
    }
}

fn monitor_config(cli: &Cli) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    Ok(MonitorConfig {
        absence_threshold: absence_threshold(cli.absence_threshold)?,
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
    })
}

fn absence_threshold(secs: f64) -> Result<Duration, String> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!(
            "Absence threshold must be a positive number of seconds, got {secs}"
        ));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| format!("Absence threshold {secs} is out of range: {e}"))
}

fn build_classifier(cli: &Cli) -> Result<Box<dyn FaceClassifier>, Box<dyn std::error::Error>> {
    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {YOLO_MODEL_NAME}");
            model_resolver::resolve(
                YOLO_MODEL_NAME,
                YOLO_MODEL_URL,
                Some(download_progress()),
            )?
        }
    };

    let detector = OnnxYoloDetector::new(&model_path, cli.confidence)?;
    Ok(Box::new(RegionFaceClassifier::new(
        Box::new(detector),
        cli.min_face_size,
    )))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(file) = &cli.file {
        if !file.exists() {
            return Err(format!("Input file not found: {}", file.display()).into());
        }
    }
    if let Some(model) = &cli.model {
        if !model.exists() {
            return Err(format!("Model file not found: {}", model.display()).into());
        }
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.min_face_size == 0 {
        return Err("Minimum face size must be at least 1 pixel".into());
    }
    absence_threshold(cli.absence_threshold)?;
    Ok(())
}

/// Logs download progress in 10% steps.
fn download_progress() -> model_resolver::ProgressFn {
    let last_step = AtomicU32::new(u32::MAX);
    Box::new(move |downloaded, total| {
        if total == 0 {
            log::debug!("Downloading face detection model... {downloaded} bytes");
            return;
        }
        let step = (downloaded as f64 / total as f64 * 10.0) as u32;
        if last_step.swap(step, Ordering::Relaxed) != step {
            log::info!("Downloading face detection model... {}%", step * 10);
        }
    })
}
