//! The fixed sprite set used for classified tiles.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use log::debug;
use rayon::prelude::*;

use crate::model::{Category, GRID_EDGE, TILE_SIZE};
use crate::processor::catalog::{SourceRect, Sprite};
use crate::processor::classification::Mark;
use crate::store::{self, ProjectStore};

/// Key of the background sprite, tiled across the whole canvas.
pub const BACKGROUND: &str = "0";

#[derive(Debug, Clone)]
pub struct SpriteAtlas {
    background: RgbaImage,
    sprites: BTreeMap<String, RgbaImage>,
}

impl SpriteAtlas {
    /// Builds an atlas from sprites keyed by file stem (`"6"`, `"11_2"`).
    pub fn new(mut sprites: BTreeMap<String, RgbaImage>) -> Result<Self> {
        let background = sprites
            .remove(BACKGROUND)
            .ok_or_else(|| anyhow!("sprite atlas has no `{BACKGROUND}.png` background"))?;
        if background.width() == 0 || background.height() == 0 {
            return Err(anyhow!("background sprite is empty"));
        }
        Ok(Self {
            background,
            sprites,
        })
    }

    /// Decode every `.png` at the root of `store`.
    pub fn load(store: &dyn ProjectStore) -> Result<Self> {
        let names: Vec<String> = store
            .list("")
            .with_context(|| "Listing sprite atlas")?
            .into_iter()
            .filter(|e| !e.is_dir && store::is_png_asset(&e.name))
            .map(|e| e.name)
            .collect();

        let sprites = names
            .par_iter()
            .map(|name| -> Result<(String, RgbaImage)> {
                let bytes = store.read(name)?;
                let image = image::load_from_memory(&bytes)
                    .with_context(|| format!("Decoding sprite {name}"))?
                    .to_rgba8();
                Ok((store::file_stem(name).to_string(), image))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        debug!("loaded {} atlas sprites", sprites.len());
        Self::new(sprites)
    }

    pub fn background(&self) -> &RgbaImage {
        &self.background
    }

    pub fn sprite(&self, key: &str) -> Option<Sprite<'_>> {
        let image = if key == BACKGROUND {
            &self.background
        } else {
            self.sprites.get(key)?
        };
        Sprite::new(
            image,
            SourceRect {
                x: 0,
                y: 0,
                width: TILE_SIZE,
                height: TILE_SIZE,
            },
        )
    }

    /// Sprite for a classified tile sitting at `(column, row)`.
    pub fn classified(&self, mark: &Mark, column: usize, row: usize) -> Option<Sprite<'_>> {
        self.sprite(&sprite_key(mark, column, row)?)
    }
}

/// Atlas key of a classified tile. `None` when a tier pushes the id out of
/// range.
pub fn sprite_key(mark: &Mark, column: usize, row: usize) -> Option<String> {
    let base = mark.category.sprite_base();
    match mark.category {
        Category::Arrow => Some(format!("{base}_{}", arrow_variant(column, row))),
        c if c.is_tiered_sprite() => {
            let id = i64::from(base) + mark.level.unwrap_or(0);
            u32::try_from(id).ok().map(|id| id.to_string())
        }
        _ => Some(base.to_string()),
    }
}

/// Arrows point out of the floor through the edge they sit on.
pub fn arrow_variant(column: usize, row: usize) -> u32 {
    if row == 0 {
        1
    } else if column == 0 {
        2
    } else if column == GRID_EDGE {
        4
    } else if row == GRID_EDGE {
        3
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn mark(category: Category, level: Option<i64>) -> Mark {
        Mark { category, level }
    }

    #[test]
    fn arrow_variants_follow_edges() {
        for column in 0..=GRID_EDGE {
            assert_eq!(arrow_variant(column, 0), 1);
        }
        for row in 1..=GRID_EDGE {
            assert_eq!(arrow_variant(GRID_EDGE, row), 4);
        }
        assert_eq!(arrow_variant(0, 5), 2);
        assert_eq!(arrow_variant(5, GRID_EDGE), 3);
        assert_eq!(arrow_variant(5, 5), 1);
    }

    #[test]
    fn tiered_sprites_add_level_to_base() {
        assert_eq!(sprite_key(&mark(Category::Door, Some(1)), 3, 3).unwrap(), "7");
        assert_eq!(sprite_key(&mark(Category::Key, Some(0)), 3, 3).unwrap(), "2");
        assert_eq!(sprite_key(&mark(Category::Item, Some(2)), 3, 3).unwrap(), "14");
        assert_eq!(sprite_key(&mark(Category::Door, Some(-10)), 3, 3), None);
    }

    #[test]
    fn fixed_sprites_ignore_level() {
        assert_eq!(sprite_key(&mark(Category::RedGem, Some(4)), 1, 1).unwrap(), "3");
        assert_eq!(sprite_key(&mark(Category::Wall, None), 1, 1).unwrap(), "1");
        assert_eq!(sprite_key(&mark(Category::Arrow, None), 0, 4).unwrap(), "11_2");
    }

    #[test]
    fn atlas_requires_background() {
        assert!(SpriteAtlas::new(BTreeMap::new()).is_err());
    }

    #[test]
    fn loads_png_sprites_from_store() {
        let mut store = MemoryStore::new();
        for name in ["0.png", "1.png", "11_1.png", "1_Highlight.png"] {
            let mut bytes = Vec::new();
            image::DynamicImage::ImageRgba8(RgbaImage::new(32, 32))
                .write_to(
                    &mut std::io::Cursor::new(&mut bytes),
                    image::ImageOutputFormat::Png,
                )
                .unwrap();
            store.insert(name, bytes);
        }
        store.insert("readme.txt", "not an image");

        let atlas = SpriteAtlas::load(&store).unwrap();
        assert!(atlas.sprite("1").is_some());
        assert!(atlas.sprite("11_1").is_some());
        assert!(atlas.sprite("0").is_some());
        assert!(atlas.sprite("1_Highlight").is_none());
        assert!(atlas.sprite("6").is_none());
    }
}
