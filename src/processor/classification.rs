//! The annotator's classification of raw tile ids.
//!
//! In memory every tile id maps to at most one [`Mark`]; the two on-disk
//! schemas are only dealt with in [`ClassificationMap::from_schema`] and
//! [`ClassificationMap::to_schema`].

use std::collections::BTreeMap;

use log::warn;

use crate::model::{Category, MappingSchema, Membership};

/// Returned by [`ClassificationMap::value`] when no overlay is shown.
pub const NO_VALUE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub category: Category,
    /// `Some` exactly when `category` is leveled.
    pub level: Option<i64>,
}

impl Mark {
    fn new(category: Category) -> Self {
        Mark {
            category,
            level: category.is_leveled().then_some(0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationMap {
    marks: BTreeMap<u32, Mark>,
}

impl ClassificationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `tile` into `category`, dropping any previous membership.
    /// Leveled categories start at value 0.
    pub fn mark_as(&mut self, tile: u32, category: Category) {
        self.marks.insert(tile, Mark::new(category));
    }

    /// Remove `tile` from every category. Returns the previous mark.
    pub fn unmark(&mut self, tile: u32) -> Option<Mark> {
        self.marks.remove(&tile)
    }

    /// Overwrite the value of a leveled tile. Returns `false` (and changes
    /// nothing) for unclassified or non-leveled tiles.
    pub fn update_value(&mut self, tile: u32, value: i64) -> bool {
        match self.marks.get_mut(&tile).and_then(|m| m.level.as_mut()) {
            Some(level) => {
                *level = value;
                true
            }
            None => false,
        }
    }

    /// Stored value of a leveled tile, [`NO_VALUE`] otherwise.
    pub fn value(&self, tile: u32) -> i64 {
        self.marks
            .get(&tile)
            .and_then(|m| m.level)
            .unwrap_or(NO_VALUE)
    }

    pub fn category_of(&self, tile: u32) -> Option<Category> {
        self.marks.get(&tile).map(|m| m.category)
    }

    pub fn get(&self, tile: u32) -> Option<&Mark> {
        self.marks.get(&tile)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Mark)> {
        self.marks.iter().map(|(tile, mark)| (*tile, mark))
    }

    /// Members of one category in ascending tile order.
    pub fn members(&self, category: Category) -> Vec<u32> {
        self.iter()
            .filter(|(_, m)| m.category == category)
            .map(|(tile, _)| tile)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    // ─────────────────────────────────────────────────────
    // Persisted form
    // ─────────────────────────────────────────────────────

    /// Resolve either on-disk schema into the canonical form.
    ///
    /// Categories are applied in [`Category::ALL`] order, so a tile listed
    /// twice ends up in the later category. Leveled categories stored as
    /// plain arrays get value 0.
    pub fn from_schema(schema: &MappingSchema) -> Self {
        let mut map = ClassificationMap::new();

        for name in schema.keys() {
            if Category::from_name(name).is_none() {
                warn!("ignoring unknown mapping category `{name}`");
            }
        }

        for category in Category::ALL {
            let Some(membership) = schema.get(category.name()) else {
                continue;
            };
            let entries: Vec<(u32, i64)> = match membership {
                Membership::Ids(ids) => ids.iter().map(|id| (*id, 0)).collect(),
                Membership::Levels(levels) => levels
                    .iter()
                    .filter_map(|(key, value)| match key.parse::<u32>() {
                        Ok(id) => Some((id, *value)),
                        Err(_) => {
                            warn!("ignoring non-numeric tile id `{key}` in `{category}`");
                            None
                        }
                    })
                    .collect(),
            };

            for (tile, value) in entries {
                if let Some(prev) = map.category_of(tile) {
                    warn!("tile {tile} listed in both `{prev}` and `{category}`, keeping `{category}`");
                }
                map.mark_as(tile, category);
                map.update_value(tile, value);
            }
        }

        map
    }

    /// Emit the leveled schema: every category present, leveled ones as
    /// id → value maps, the rest as id arrays.
    pub fn to_schema(&self) -> MappingSchema {
        let mut schema = MappingSchema::new();
        for category in Category::ALL {
            let membership = if category.is_leveled() {
                Membership::Levels(BTreeMap::new())
            } else {
                Membership::Ids(Vec::new())
            };
            schema.insert(category.name().to_string(), membership);
        }

        for (tile, mark) in self.iter() {
            let Some(membership) = schema.get_mut(mark.category.name()) else {
                continue;
            };
            match membership {
                Membership::Levels(levels) => {
                    levels.insert(tile.to_string(), mark.level.unwrap_or(0));
                }
                Membership::Ids(ids) => ids.push(tile),
            }
        }

        schema
    }
}
