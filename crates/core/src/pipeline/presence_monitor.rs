use std::convert::Infallible;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::capture::domain::camera_source::{CameraSource, CaptureError};
use crate::detection::domain::face_classifier::FaceClassifier;
use crate::pipeline::monitor_logger::MonitorLogger;
use crate::presence::domain::presence_state::{PresenceEvent, PresenceState};
use crate::presence::domain::signal::{ErrorReason, Signal};
use crate::presence::domain::signal_sink::SignalSink;
use crate::shared::clock::Clock;
use crate::shared::constants::{DEFAULT_ABSENCE_THRESHOLD, DEFAULT_POLL_INTERVAL};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
    pub absence_threshold: Duration,
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            absence_threshold: DEFAULT_ABSENCE_THRESHOLD,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Why the monitor loop ended. Every variant is terminal.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("camera failure: {0}")]
    Camera(#[source] CaptureError),
    #[error("face detector failure: {0}")]
    Detector(String),
    #[error("failed to write signal: {0}")]
    Output(#[source] std::io::Error),
}

impl MonitorError {
    /// The protocol line announcing this failure, if one can still be sent.
    pub fn signal(&self) -> Option<Signal> {
        match self {
            MonitorError::Camera(_) => Some(Signal::Error(ErrorReason::CameraFail)),
            MonitorError::Detector(_) => Some(Signal::Error(ErrorReason::DetectorFail)),
            MonitorError::Output(_) => None,
        }
    }
}

/// Samples a camera, classifies each frame and emits debounced presence
/// signals.
///
/// Per iteration: read a frame, classify it, take `now` from the clock,
/// feed the [`PresenceState`], emit at most one event, then sleep for the
/// poll interval. The first capture, detector or output failure ends the
/// loop.
pub struct PresenceMonitor {
    camera: Box<dyn CameraSource>,
    classifier: Box<dyn FaceClassifier>,
    sink: Box<dyn SignalSink>,
    clock: Box<dyn Clock>,
    logger: Box<dyn MonitorLogger>,
    state: PresenceState,
    poll_interval: Duration,
}

impl PresenceMonitor {
    pub fn new(
        camera: Box<dyn CameraSource>,
        classifier: Box<dyn FaceClassifier>,
        sink: Box<dyn SignalSink>,
        clock: Box<dyn Clock>,
        logger: Box<dyn MonitorLogger>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            camera,
            classifier,
            sink,
            clock,
            logger,
            state: PresenceState::new(config.absence_threshold),
            poll_interval: config.poll_interval,
        }
    }

    /// Emits `READY` and samples until a fatal error, which is returned.
    ///
    /// Camera and detector failures are announced on the sink before
    /// returning. The camera is released exactly once on the way out.
    pub fn run(mut self) -> MonitorError {
        let error = match self.run_loop() {
            Ok(never) => match never {},
            Err(e) => e,
        };

        if let Some(signal) = error.signal() {
            if let Err(e) = self.sink.emit(&signal) {
                log::error!("Could not report {signal}: {e}");
            }
        }
        log::error!("Monitor stopped: {error}");

        self.camera.release();
        self.logger.summary();
        error
    }

    fn run_loop(&mut self) -> Result<Infallible, MonitorError> {
        self.emit(&Signal::Ready)?;
        self.logger.info(&format!(
            "Monitoring (absence threshold {:.1}s, poll interval {}ms)",
            self.state.absence_threshold().as_secs_f64(),
            self.poll_interval.as_millis()
        ));

        loop {
            self.step()?;
            self.clock.sleep(self.poll_interval);
        }
    }

    /// One sample: capture, classify, transition.
    fn step(&mut self) -> Result<Option<PresenceEvent>, MonitorError> {
        let t0 = Instant::now();
        let frame = self.camera.read_frame().map_err(MonitorError::Camera)?;
        self.logger.timing("capture", elapsed_ms(t0));

        let t0 = Instant::now();
        let has_face = self
            .classifier
            .has_face(&frame)
            .map_err(|e| MonitorError::Detector(e.to_string()))?;
        self.logger.timing("detect", elapsed_ms(t0));
        self.logger.sample(has_face);

        let now = self.clock.now();
        let event = self.state.observe(has_face, now);
        if let Some(event) = event {
            self.logger.info(&format!("Frame {}: {event:?}", frame.index()));
            self.emit(&Signal::from(event))?;
        }
        Ok(event)
    }

    fn emit(&mut self, signal: &Signal) -> Result<(), MonitorError> {
        self.sink.emit(signal).map_err(MonitorError::Output)
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
