use std::time::Duration;

pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Continuous absence required before `FACE_LOST` is emitted.
pub const DEFAULT_ABSENCE_THRESHOLD: Duration = Duration::from_secs(3);

/// Pause between samples; also the minimum event latency.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Smallest face side, in pixels, that counts as a detection.
pub const DEFAULT_MIN_FACE_SIZE: u32 = 30;

#[cfg(target_os = "linux")]
pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
#[cfg(target_os = "linux")]
pub const DEFAULT_CAMERA_FORMAT: &str = "v4l2";

#[cfg(target_os = "macos")]
pub const DEFAULT_CAMERA_DEVICE: &str = "0";
#[cfg(target_os = "macos")]
pub const DEFAULT_CAMERA_FORMAT: &str = "avfoundation";

#[cfg(target_os = "windows")]
pub const DEFAULT_CAMERA_DEVICE: &str = "video=Integrated Camera";
#[cfg(target_os = "windows")]
pub const DEFAULT_CAMERA_FORMAT: &str = "dshow";

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const DEFAULT_CAMERA_FORMAT: &str = "v4l2";
