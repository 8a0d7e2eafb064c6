use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CropRect {
    /// Left edge (pixels)
    pub x: u32,
    /// Top edge (pixels)
    pub y: u32,
    /// Width of the rectangle (pixels)
    pub width: u32,
    /// Height of the rectangle (pixels)
    pub height: u32,
}

impl CropRect {
    /// Create a new crop rectangle.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Check that the rectangle lies fully inside a `frame_width` x `frame_height` frame.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= frame_width as u64
            && self.y as u64 + self.height as u64 <= frame_height as u64
    }

    /// Width divided by height.
    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }

    /// FFmpeg `crop` filter expression (`crop=w:h:x:y`).
    pub fn to_filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_within() {
        assert!(CropRect::new(0, 0, 1920, 1080).fits_within(1920, 1080));
        assert!(CropRect::new(656, 0, 608, 1080).fits_within(1920, 1080));
        assert!(!CropRect::new(1400, 0, 608, 1080).fits_within(1920, 1080));
        assert!(!CropRect::new(0, 0, 0, 1080).fits_within(1920, 1080));
    }

    #[test]
    fn test_filter_expression() {
        assert_eq!(CropRect::new(10, 20, 300, 400).to_filter(), "crop=300:400:10:20");
    }
}
