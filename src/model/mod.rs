use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// numeric constants that describe the floor grid / sprite sheets
pub const TILE_SIZE: u32 = 32;
pub const TALL_TILE_HEIGHT: u32 = 48;

pub const GRID_CELLS: u32 = 13;
pub const CANVAS_SIZE: u32 = TILE_SIZE * GRID_CELLS; // 416
/// Index of the last row / column of a standard floor.
pub const GRID_EDGE: usize = (GRID_CELLS - 1) as usize; // 12

/// Tile ids at or above this threshold address the extra tilesets.
pub const EXTENDED_ID_BASE: u32 = 10000;

pub const FLOOR_TAG_LEN: usize = 64;

/// One floor as a grid of raw tile ids, `grid[row][column]`.
pub type FloorGrid = Vec<Vec<u32>>;

/// ─────────────────────────────────────────────────────
/// Classification categories
/// ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    RedGem,
    BlueGem,
    GreenGem,
    YellowGem,
    Item,
    Potion,
    Key,
    Door,
    Floor,
    Arrow,
    Wall,
    Decoration,
}

impl Category {
    /// Canonical order, also the order conflicts are resolved in on load.
    pub const ALL: [Category; 12] = [
        Category::RedGem,
        Category::BlueGem,
        Category::GreenGem,
        Category::YellowGem,
        Category::Item,
        Category::Potion,
        Category::Key,
        Category::Door,
        Category::Floor,
        Category::Arrow,
        Category::Wall,
        Category::Decoration,
    ];

    /// Key used in `ginka-config.json`.
    pub fn name(self) -> &'static str {
        match self {
            Category::RedGem => "redGem",
            Category::BlueGem => "blueGem",
            Category::GreenGem => "greenGem",
            Category::YellowGem => "yellowGem",
            Category::Item => "item",
            Category::Potion => "potion",
            Category::Key => "key",
            Category::Door => "door",
            Category::Floor => "floor",
            Category::Arrow => "arrow",
            Category::Wall => "wall",
            Category::Decoration => "decoration",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Leveled categories carry a tier / value per tile id.
    pub fn is_leveled(self) -> bool {
        !matches!(
            self,
            Category::Floor | Category::Arrow | Category::Wall | Category::Decoration
        )
    }

    /// Sprite id inside the fixed atlas.
    pub fn sprite_base(self) -> u32 {
        match self {
            Category::Floor => 0,
            Category::Wall => 1,
            Category::Key => 2,
            Category::RedGem => 3,
            Category::BlueGem => 4,
            Category::Potion => 5,
            Category::Door => 6,
            Category::Decoration => 10,
            Category::Arrow => 11,
            Category::Item => 12,
            Category::GreenGem => 13,
            Category::YellowGem => 999,
        }
    }

    /// Categories whose sprite is picked by `base + value`.
    pub fn is_tiered_sprite(self) -> bool {
        matches!(self, Category::Door | Category::Key | Category::Item)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            let known: Vec<_> = Self::ALL.iter().map(|c| c.name()).collect();
            format!("unknown category `{s}` (expected one of {})", known.join(", "))
        })
    }
}

/// ─────────────────────────────────────────────────────
/// Sprite sheet kinds referenced by `maps.js`
/// ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SheetKind {
    Terrains,
    Animates,
    Npcs,
    Npc48,
    Enemys,
    Enemy48,
    Items,
    Autotile,
    /// Placeholder class: such tiles are drawn through extended ids.
    Tilesets,
}

impl SheetKind {
    /// Sheets loaded from `materials/<name>.png`.
    pub const MATERIALS: [SheetKind; 7] = [
        SheetKind::Terrains,
        SheetKind::Animates,
        SheetKind::Npcs,
        SheetKind::Npc48,
        SheetKind::Enemys,
        SheetKind::Enemy48,
        SheetKind::Items,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SheetKind::Terrains => "terrains",
            SheetKind::Animates => "animates",
            SheetKind::Npcs => "npcs",
            SheetKind::Npc48 => "npc48",
            SheetKind::Enemys => "enemys",
            SheetKind::Enemy48 => "enemy48",
            SheetKind::Items => "items",
            SheetKind::Autotile => "autotile",
            SheetKind::Tilesets => "tilesets",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "terrains" => Some(SheetKind::Terrains),
            "animates" => Some(SheetKind::Animates),
            "npcs" => Some(SheetKind::Npcs),
            "npc48" => Some(SheetKind::Npc48),
            "enemys" => Some(SheetKind::Enemys),
            "enemy48" => Some(SheetKind::Enemy48),
            "items" => Some(SheetKind::Items),
            "autotile" => Some(SheetKind::Autotile),
            "tilesets" => Some(SheetKind::Tilesets),
            _ => None,
        }
    }

    pub fn is_tall(self) -> bool {
        matches!(self, SheetKind::Npc48 | SheetKind::Enemy48)
    }
}

/// ─────────────────────────────────────────────────────
/// `data.js`
/// ─────────────────────────────────────────────────────

/// Project metadata. Only `main.floorIds` / `main.tilesets` are
/// interpreted; everything else is carried through untouched.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TowerData {
    pub main: TowerMain,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TowerMain {
    #[serde(rename = "floorIds")]
    pub floor_ids: Vec<String>,
    /// Ordered extra sheets, file names with extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilesets: Option<Vec<String>>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// One `maps.js` entry: raw tile id → `(cls, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MapsEntry {
    pub id: String,
    pub cls: String,
}

/// `icons.js`: sheet name → sprite id → icon index.
pub type Icons = BTreeMap<String, BTreeMap<String, u32>>;

/// `floors/<id>.js` – only the grid is kept.
#[derive(Debug, Deserialize)]
pub struct FloorFile {
    pub map: FloorGrid,
}

/// ─────────────────────────────────────────────────────
/// `ginka-config.json`
/// ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GinkaConfig {
    #[serde(default)]
    pub clip: Clip,
    #[serde(default)]
    pub data: BTreeMap<String, FloorData>,
    #[serde(default)]
    pub mapping: MappingSchema,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Clip {
    #[serde(default)]
    pub defaults: [i32; 4],
    #[serde(default)]
    pub special: BTreeMap<String, [i32; 4]>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FloorData {
    #[serde(default)]
    pub tag: Vec<u8>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Category name → membership, exactly as found on disk.
pub type MappingSchema = BTreeMap<String, Membership>;

/// The two on-disk shapes of one category.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Membership {
    /// Array schema: membership only.
    Ids(Vec<u32>),
    /// Leveled schema: tile id (as a JSON key) → value.
    Levels(BTreeMap<String, i64>),
}

/// ─────────────────────────────────────────────────────
/// Per-floor annotation tag
/// ─────────────────────────────────────────────────────
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FloorTag([bool; FLOOR_TAG_LEN]);

impl Default for FloorTag {
    fn default() -> Self {
        FloorTag([false; FLOOR_TAG_LEN])
    }
}

impl FloorTag {
    pub fn get(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, index: usize, value: bool) {
        if let Some(bit) = self.0.get_mut(index) {
            *bit = value;
        }
    }

    /// Builds a tag from a persisted 0/1 vector. Short vectors are padded
    /// with `false`, long ones truncated.
    pub fn from_bits(bits: &[u8]) -> Self {
        let mut tag = FloorTag::default();
        for (slot, bit) in tag.0.iter_mut().zip(bits) {
            *slot = *bit != 0;
        }
        tag
    }

    pub fn to_bits(&self) -> Vec<u8> {
        self.0.iter().map(|b| u8::from(*b)).collect()
    }
}

impl fmt::Display for FloorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for FloorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FloorTag({self})")
    }
}

impl FromStr for FloorTag {
    type Err = String;

    /// Parses a `0`/`1` string of at most 64 characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > FLOOR_TAG_LEN {
            return Err(format!(
                "tag has {} bits, at most {FLOOR_TAG_LEN} allowed",
                s.len()
            ));
        }
        let mut tag = FloorTag::default();
        for (i, ch) in s.chars().enumerate() {
            match ch {
                '0' => {}
                '1' => tag.set(i, true),
                other => return Err(format!("invalid tag bit `{other}` at {i}")),
            }
        }
        Ok(tag)
    }
}
