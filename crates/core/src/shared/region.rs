/// An axis-aligned face bounding box in frame pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
}

impl Region {
    /// True when both sides reach `min_size` pixels.
    pub fn meets_min_size(&self, min_size: u32) -> bool {
        let min = min_size as i64;
        self.width as i64 >= min && self.height as i64 >= min
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }
}
