//! Mapping between the processed crop and the full image frame.

use glam::Vec2;

/// Placement of the processed crop inside the full image.
///
/// `full_width × full_height` is the whole image at processing resolution;
/// crop pixel `(x, y)` sits at `(x + offset_x, y + offset_y)` in it. `scale`
/// converts full-resolution (original file) pixels to processing pixels, so
/// parameters expressed in file pixels are multiplied by it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskGeometry {
    pub offset_x: i32,
    pub offset_y: i32,
    pub full_width: u32,
    pub full_height: u32,
    pub scale: f64,
}

impl MaskGeometry {
    /// Geometry of an unscaled, uncropped `width × height` image.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            full_width: width,
            full_height: height,
            scale: 1.0,
        }
    }

    /// Center of crop pixel `(x, y)` in full-image processing pixels.
    pub fn pixel_center(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(
            x as f32 + self.offset_x as f32 + 0.5,
            y as f32 + self.offset_y as f32 + 0.5,
        )
    }

    /// Normalized full-image coordinates to processing pixels.
    pub fn to_pixels(&self, p: [f32; 2]) -> Vec2 {
        Vec2::new(p[0] * self.full_width as f32, p[1] * self.full_height as f32)
    }

    /// Shorter side of the full image in processing pixels.
    pub fn short_side(&self) -> f32 {
        self.full_width.min(self.full_height) as f32
    }

    /// A length in full-resolution file pixels, in processing pixels.
    pub fn scaled(&self, file_pixels: f32) -> f32 {
        (f64::from(file_pixels) * self.scale) as f32
    }
}
