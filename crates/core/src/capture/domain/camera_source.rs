use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to open camera {device}: {reason}")]
    Open { device: String, reason: String },
    #[error("camera is not open")]
    NotOpen,
    #[error("camera stream ended")]
    EndOfStream,
    #[error("camera read failed: {0}")]
    Device(String),
}

/// A live frame source, opened once at startup.
///
/// Any `Err` from [`read_frame`](CameraSource::read_frame) is a capture
/// failure; the monitor does not retry it.
pub trait CameraSource: Send {
    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Releases the underlying device. Further reads return [`CaptureError::NotOpen`].
    fn release(&mut self);
}
