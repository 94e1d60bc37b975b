use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for face localisation.
///
/// Implementations may hold inference sessions or scratch buffers,
/// hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
