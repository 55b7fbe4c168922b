//! Raw tile id → source rectangle lookup for tiles nobody classified yet.

use std::collections::BTreeMap;

use image::RgbaImage;

use crate::model::{
    EXTENDED_ID_BASE, Icons, MapsEntry, SheetKind, TALL_TILE_HEIGHT, TILE_SIZE,
};

/// Decoded project images. Replaced wholesale on every project load.
#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    /// The fixed `materials/*.png` sheets.
    pub sheets: BTreeMap<SheetKind, RgbaImage>,
    /// `autotiles/<name>.png` keyed by name.
    pub autotiles: BTreeMap<String, RgbaImage>,
    /// Extra sheets in extended-id order.
    pub tilesets: Vec<(String, RgbaImage)>,
}

impl AssetBundle {
    pub fn tileset(&self, index: usize) -> Option<&RgbaImage> {
        self.tilesets.get(index).map(|(_, image)| image)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A region of a loaded image, guaranteed to lie inside it.
#[derive(Debug, Clone, Copy)]
pub struct Sprite<'a> {
    pub image: &'a RgbaImage,
    pub rect: SourceRect,
}

impl<'a> Sprite<'a> {
    pub fn new(image: &'a RgbaImage, rect: SourceRect) -> Option<Self> {
        let fits_x = rect.x.checked_add(rect.width)? <= image.width();
        let fits_y = rect.y.checked_add(rect.height)? <= image.height();
        (fits_x && fits_y && rect.width > 0 && rect.height > 0).then_some(Sprite { image, rect })
    }
}

/// Static per-project lookup built from `maps.js` and `icons.js`.
#[derive(Debug, Clone, Default)]
pub struct TileCatalog {
    maps: BTreeMap<u32, MapsEntry>,
    icons: Icons,
}

impl TileCatalog {
    pub fn new(maps: BTreeMap<u32, MapsEntry>, icons: Icons) -> Self {
        Self { maps, icons }
    }

    pub fn entry(&self, tile: u32) -> Option<&MapsEntry> {
        self.maps.get(&tile)
    }

    /// Find the image region for `tile`. `None` means "draw nothing".
    pub fn resolve<'a>(&self, tile: u32, assets: &'a AssetBundle) -> Option<Sprite<'a>> {
        if tile >= EXTENDED_ID_BASE {
            return resolve_extended(tile, assets);
        }

        let entry = self.maps.get(&tile)?;
        let kind = SheetKind::from_name(&entry.cls)?;
        match kind {
            SheetKind::Tilesets => None,
            SheetKind::Autotile => {
                let image = assets.autotiles.get(&entry.id)?;
                Sprite::new(image, square(0, 0))
            }
            _ => {
                let icon = *self.icons.get(kind.name())?.get(&entry.id)?;
                let image = assets.sheets.get(&kind)?;
                // both 48-tall sheets step by their own height
                let height = if kind.is_tall() { TALL_TILE_HEIGHT } else { TILE_SIZE };
                let rect = SourceRect {
                    x: 0,
                    y: icon.checked_mul(height)?,
                    width: TILE_SIZE,
                    height,
                };
                Sprite::new(image, rect)
            }
        }
    }
}

/// `id = 10000 * (sheet + 1) + local`, local ids run row-major over the
/// sheet in 32×32 cells.
fn resolve_extended(tile: u32, assets: &AssetBundle) -> Option<Sprite<'_>> {
    let sheet = (tile / EXTENDED_ID_BASE - 1) as usize;
    let local = tile % EXTENDED_ID_BASE;
    let image = assets.tileset(sheet)?;

    let columns = image.width() / TILE_SIZE;
    if columns == 0 {
        return None;
    }
    let column = local % columns;
    let row = local / columns;
    Sprite::new(image, square(column * TILE_SIZE, row * TILE_SIZE))
}

fn square(x: u32, y: u32) -> SourceRect {
    SourceRect {
        x,
        y,
        width: TILE_SIZE,
        height: TILE_SIZE,
    }
}
