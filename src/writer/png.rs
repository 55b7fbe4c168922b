//! PNG export of rendered frames.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Save `frame`, scaled to `size × size` with nearest-neighbour sampling
/// when a size is given.
pub fn save_frame(frame: &RgbaImage, path: &Path, size: Option<u32>) -> Result<()> {
    let scaled;
    let out = match size {
        Some(px) if px > 0 && px != frame.width() => {
            scaled = imageops::resize(frame, px, px, FilterType::Nearest);
            &scaled
        }
        _ => frame,
    };
    out.save(path)
        .with_context(|| format!("Writing {}", path.display()))
}
