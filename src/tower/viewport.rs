//! Square on-screen canvas geometry and pointer → cell translation.

use crate::model::{CANVAS_SIZE, TILE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Side of the backing canvas in device pixels.
    pub canvas_px: u32,
    /// Layout pixels per frame unit.
    pub scale: f64,
}

impl Viewport {
    /// Largest square that fits a `width × height` container.
    pub fn fit(width: f64, height: f64, pixel_ratio: f64) -> Self {
        let size = width.min(height).max(0.0);
        let canvas_px = (size * pixel_ratio).floor() as u32;
        let frame_scale = f64::from(canvas_px) / f64::from(CANVAS_SIZE);
        let scale = if pixel_ratio > 0.0 {
            frame_scale / pixel_ratio
        } else {
            0.0
        };
        Self { canvas_px, scale }
    }

    /// Grid cell under a pointer offset given in layout pixels. Cells off
    /// the floor (negative or past the edge) are returned as-is.
    pub fn cell_at(&self, offset_x: f64, offset_y: f64) -> Option<(i32, i32)> {
        if self.scale <= 0.0 {
            return None;
        }
        let tile = f64::from(TILE_SIZE);
        let x = (offset_x / self.scale / tile).floor();
        let y = (offset_y / self.scale / tile).floor();
        Some((x as i32, y as i32))
    }
}
