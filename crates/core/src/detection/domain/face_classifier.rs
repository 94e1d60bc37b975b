use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;

/// Answers one question per frame: is at least one face visible?
pub trait FaceClassifier: Send {
    fn has_face(&mut self, frame: &Frame) -> Result<bool, Box<dyn std::error::Error>>;
}

/// Adapts a [`FaceDetector`] into a [`FaceClassifier`].
///
/// A frame counts as containing a face when the detector returns at least
/// one region whose width and height both reach `min_face_size` pixels.
pub struct RegionFaceClassifier {
    detector: Box<dyn FaceDetector>,
    min_face_size: u32,
}

impl RegionFaceClassifier {
    pub fn new(detector: Box<dyn FaceDetector>, min_face_size: u32) -> Self {
        Self {
            detector,
            min_face_size,
        }
    }
}

impl FaceClassifier for RegionFaceClassifier {
    fn has_face(&mut self, frame: &Frame) -> Result<bool, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(false);
        }
        let regions = self.detector.detect(frame)?;
        let largest = regions
            .iter()
            .filter(|r| r.meets_min_size(self.min_face_size))
            .map(|r| r.area())
            .max();

        if let Some(area) = largest {
            log::trace!(
                "Frame {}: {} region(s), largest qualifying face {area}px²",
                frame.index(),
                regions.len()
            );
        }
        Ok(largest.is_some())
    }
}
