//! Composites one floor into a 416×416 raster.
//!
//! Pass 1 tiles the background, pass 2 draws one sprite per cell, pass 3
//! draws value labels so no sprite can cover them. Output depends only on
//! the inputs.

use image::{RgbaImage, imageops};

use crate::model::{CANVAS_SIZE, TILE_SIZE};
use crate::processor::atlas::SpriteAtlas;
use crate::processor::catalog::{AssetBundle, Sprite, TileCatalog};
use crate::processor::classification::{ClassificationMap, NO_VALUE};
use crate::processor::label;

/// Labels are clipped to this many pixels from the cell's left edge.
pub const LABEL_WIDTH: i32 = 30;

pub struct RenderEngine<'a> {
    pub classification: &'a ClassificationMap,
    pub catalog: &'a TileCatalog,
    pub atlas: &'a SpriteAtlas,
    pub assets: &'a AssetBundle,
}

impl<'a> RenderEngine<'a> {
    /// Render `grid`; with no grid only the background is painted.
    pub fn render_floor(&self, grid: Option<&[Vec<u32>]>) -> RgbaImage {
        let mut canvas = RgbaImage::new(CANVAS_SIZE, CANVAS_SIZE);
        paint_background(&mut canvas, self.atlas.background());

        let Some(grid) = grid else {
            return canvas;
        };

        for (row, tiles) in grid.iter().enumerate() {
            for (column, tile) in tiles.iter().enumerate() {
                if let Some(sprite) = self.sprite_at(*tile, column, row) {
                    blit(&mut canvas, &sprite, column, row);
                }
            }
        }

        for (row, tiles) in grid.iter().enumerate() {
            for (column, tile) in tiles.iter().enumerate() {
                let value = self.classification.value(*tile);
                if value == NO_VALUE {
                    continue;
                }
                // anchored on the cell's bottom edge so the text stays inside it
                label::draw_label(
                    &mut canvas,
                    (column as u32 * TILE_SIZE) as i32,
                    ((row as u32 + 1) * TILE_SIZE) as i32,
                    &label::format(value as f64),
                    LABEL_WIDTH,
                );
            }
        }

        canvas
    }

    /// Classified tiles come from the atlas, everything else from the
    /// project catalog.
    pub fn sprite_at(&self, tile: u32, column: usize, row: usize) -> Option<Sprite<'a>> {
        match self.classification.get(tile) {
            Some(mark) => self.atlas.classified(mark, column, row),
            None => self.catalog.resolve(tile, self.assets),
        }
    }
}

fn paint_background(canvas: &mut RgbaImage, pattern: &RgbaImage) {
    let (w, h) = (pattern.width() as usize, pattern.height() as usize);
    for y in (0..canvas.height()).step_by(h) {
        for x in (0..canvas.width()).step_by(w) {
            imageops::replace(canvas, pattern, i64::from(x), i64::from(y));
        }
    }
}

/// Bottom-centre the sprite on its cell; tall sprites overhang upwards.
fn blit(canvas: &mut RgbaImage, sprite: &Sprite<'_>, column: usize, row: usize) {
    let rect = sprite.rect;
    let tile = i64::from(TILE_SIZE);
    let dx = column as i64 * tile + tile / 2 - i64::from(rect.width) / 2;
    let dy = row as i64 * tile + tile - i64::from(rect.height);
    let view = imageops::crop_imm(sprite.image, rect.x, rect.y, rect.width, rect.height);
    imageops::overlay(canvas, &*view, dx, dy);
}
