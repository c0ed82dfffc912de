//! World/screen conversion for pointer input

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

/// Viewport onto the world. Pixels are square, so `dim.x` sets the scale
/// and screen y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World position of the bottom-left screen corner
    pub pos: DVec2,
    /// Visible world extent
    pub dim: DVec2,
    pub screen_width: i32,
    pub screen_height: i32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: DVec2::ZERO,
            dim: DVec2::splat(16.0),
            screen_width: 640,
            screen_height: 640,
        }
    }
}

impl Camera {
    fn pixels_per_unit(&self) -> f64 {
        f64::from(self.screen_height) / self.dim.x
    }

    /// Screen pixel to world point
    pub fn to_world(&self, pixel: IVec2) -> DVec2 {
        let scale = self.pixels_per_unit();
        let frame = DVec2::new(
            f64::from(pixel.x),
            f64::from(self.screen_height - pixel.y),
        ) / scale;
        frame + self.pos
    }

    /// World point to screen pixel (truncating)
    pub fn to_pixel(&self, point: DVec2) -> IVec2 {
        let frame = (point - self.pos) * self.pixels_per_unit();
        IVec2::new(frame.x as i32, self.screen_height - frame.y as i32)
    }
}
