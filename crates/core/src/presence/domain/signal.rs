use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::presence_state::PresenceEvent;

/// Why the monitor stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorReason {
    CameraFail,
    DetectorFail,
    /// Any reason token this build does not know about.
    Other(String),
}

impl ErrorReason {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorReason::CameraFail => "CAMERA_FAIL",
            ErrorReason::DetectorFail => "DETECTOR_FAIL",
            ErrorReason::Other(reason) => reason,
        }
    }
}

/// One line of the stdout protocol.
///
/// The wire form is the [`Display`](fmt::Display) output, e.g. `READY` or
/// `ERROR:CAMERA_FAIL`. Consumers can parse lines back with [`str::parse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    Ready,
    FaceDetected,
    FaceLost,
    Error(ErrorReason),
}

const ERROR_PREFIX: &str = "ERROR:";

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Ready => f.write_str("READY"),
            Signal::FaceDetected => f.write_str("FACE_DETECTED"),
            Signal::FaceLost => f.write_str("FACE_LOST"),
            Signal::Error(reason) => write!(f, "{ERROR_PREFIX}{}", reason.as_str()),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseSignalError {
    #[error("empty signal line")]
    Empty,
    #[error("error signal without a reason")]
    MissingReason,
    #[error("unknown signal: {0}")]
    Unknown(String),
}

impl FromStr for Signal {
    type Err = ParseSignalError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        match line {
            "" => Err(ParseSignalError::Empty),
            "READY" => Ok(Signal::Ready),
            "FACE_DETECTED" => Ok(Signal::FaceDetected),
            "FACE_LOST" => Ok(Signal::FaceLost),
            _ => {
                let reason = line
                    .strip_prefix(ERROR_PREFIX)
                    .ok_or_else(|| ParseSignalError::Unknown(line.to_string()))?;
                Ok(Signal::Error(match reason {
                    "" => return Err(ParseSignalError::MissingReason),
                    "CAMERA_FAIL" => ErrorReason::CameraFail,
                    "DETECTOR_FAIL" => ErrorReason::DetectorFail,
                    other => ErrorReason::Other(other.to_string()),
                }))
            }
        }
    }
}

impl From<PresenceEvent> for Signal {
    fn from(event: PresenceEvent) -> Self {
        match event {
            PresenceEvent::FaceDetected => Signal::FaceDetected,
            PresenceEvent::FaceLost => Signal::FaceLost,
        }
    }
}
