//! The functional core: classification state, tile lookup and rendering.
pub mod atlas;
pub mod catalog;
pub mod classification;
pub mod label;
pub mod render;

pub use atlas::SpriteAtlas;
pub use catalog::{AssetBundle, SourceRect, Sprite, TileCatalog};
pub use classification::{ClassificationMap, Mark, NO_VALUE};
pub use render::RenderEngine;
