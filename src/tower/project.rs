//! Everything loaded for one project, and its load / save round trip.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::model::{
    Clip, FLOOR_TAG_LEN, FloorData, FloorGrid, FloorTag, GinkaConfig, SheetKind, TowerData,
};
use crate::parser;
use crate::processor::{AssetBundle, ClassificationMap, TileCatalog};
use crate::store::{self, ProjectStore};
use crate::writer;

pub const DATA_PATH: &str = "data.js";
pub const MAPS_PATH: &str = "maps.js";
pub const ICONS_PATH: &str = "icons.js";
pub const CONFIG_PATH: &str = "ginka-config.json";

const FLOORS_DIR: &str = "floors";
const MATERIALS_DIR: &str = "materials";
const AUTOTILES_DIR: &str = "autotiles";
const TILESETS_DIR: &str = "tilesets";

pub struct Project {
    store: Box<dyn ProjectStore>,
    pub data: TowerData,
    pub catalog: TileCatalog,
    pub clip: Clip,
    /// Per-floor entries of the config's `data` section.
    pub floor_data: BTreeMap<String, FloorData>,
    pub classification: ClassificationMap,
    /// Top-level config keys this crate does not interpret.
    pub config_rest: Map<String, Value>,
    pub floors: BTreeMap<String, FloorGrid>,
    pub assets: AssetBundle,
    /// Index into `data.main.floor_ids`.
    pub cursor: usize,
}

/// One independent read + decode of the loading fan-out.
enum Job {
    Floor(String, String),
    Sheet(SheetKind, String),
    Autotile(String, String),
    Tileset(usize, String, String),
}

enum Loaded {
    Floor(String, FloorGrid),
    Sheet(SheetKind, RgbaImage),
    Autotile(String, RgbaImage),
    Tileset(usize, String, RgbaImage),
}

impl Project {
    /// Load a whole project. Nothing is returned unless every artifact was
    /// read and decoded.
    pub fn load(store: Box<dyn ProjectStore>) -> Result<Self> {
        // 1. ── Base metadata ──────────────────────────────────────────
        let data = parser::parse_data(&read_text(store.as_ref(), DATA_PATH)?)?;
        let maps = parser::parse_maps(&read_text(store.as_ref(), MAPS_PATH)?)?;
        let icons = parser::parse_icons(&read_text(store.as_ref(), ICONS_PATH)?)?;
        let config = parser::parse_config(&read_text(store.as_ref(), CONFIG_PATH)?)?;

        // 2. ── Plan every floor and image ─────────────────────────────
        let jobs = plan_jobs(store.as_ref(), &data)?;
        debug!("loading {} project files", jobs.len());

        // 3. ── Fan out, join as one result ────────────────────────────
        let loaded = jobs
            .par_iter()
            .map(|job| run_job(store.as_ref(), job))
            .collect::<Result<Vec<Loaded>>>()?;

        let mut floors = BTreeMap::new();
        let mut assets = AssetBundle::default();
        let mut tilesets = Vec::new();
        for item in loaded {
            match item {
                Loaded::Floor(id, grid) => {
                    floors.insert(id, grid);
                }
                Loaded::Sheet(kind, image) => {
                    assets.sheets.insert(kind, image);
                }
                Loaded::Autotile(name, image) => {
                    assets.autotiles.insert(name, image);
                }
                Loaded::Tileset(index, name, image) => tilesets.push((index, name, image)),
            }
        }
        tilesets.sort_by_key(|(index, _, _)| *index);
        assets.tilesets = tilesets
            .into_iter()
            .map(|(_, name, image)| (name, image))
            .collect();

        for (id, entry) in &config.data {
            if entry.tag.len() != FLOOR_TAG_LEN {
                warn!(
                    "floor `{id}` tag has {} bits, expected {FLOOR_TAG_LEN}",
                    entry.tag.len()
                );
            }
        }
        for id in &data.main.floor_ids {
            if !floors.contains_key(id) {
                warn!("floor `{id}` is listed in data.js but has no file");
            }
        }

        let classification = ClassificationMap::from_schema(&config.mapping);
        info!(
            "loaded {} floors, {} autotiles, {} tilesets, {} classified tiles",
            floors.len(),
            assets.autotiles.len(),
            assets.tilesets.len(),
            classification.len()
        );

        Ok(Project {
            store,
            data,
            catalog: TileCatalog::new(maps, icons),
            clip: config.clip,
            floor_data: config.data,
            classification,
            config_rest: config.rest,
            floors,
            assets,
            cursor: 0,
        })
    }

    pub fn store(&self) -> &dyn ProjectStore {
        self.store.as_ref()
    }

    pub fn floor_ids(&self) -> &[String] {
        &self.data.main.floor_ids
    }

    pub fn active_floor_id(&self) -> Option<&str> {
        self.floor_ids().get(self.cursor).map(String::as_str)
    }

    pub fn active_grid(&self) -> Option<&FloorGrid> {
        self.floors.get(self.active_floor_id()?)
    }

    pub fn floor_tag(&self, floor_id: &str) -> FloorTag {
        self.floor_data
            .get(floor_id)
            .map(|entry| FloorTag::from_bits(&entry.tag))
            .unwrap_or_default()
    }

    /// Creates the floor's config entry on first write.
    pub fn set_floor_tag(&mut self, floor_id: &str, tag: FloorTag) {
        self.floor_data
            .entry(floor_id.to_string())
            .or_default()
            .tag = tag.to_bits();
    }

    /// The config as it would be written right now.
    pub fn config(&self) -> GinkaConfig {
        GinkaConfig {
            clip: self.clip.clone(),
            data: self.floor_data.clone(),
            mapping: self.classification.to_schema(),
            rest: self.config_rest.clone(),
        }
    }

    /// Write `data.js` and `ginka-config.json` back. Both writes are
    /// attempted; the first failure is reported.
    pub fn persist(&mut self) -> Result<()> {
        let data = writer::data_script(&self.data)?;
        let config = writer::config_json(&self.config())?;

        let data_written = self
            .store
            .write(DATA_PATH, data.as_bytes())
            .with_context(|| format!("Writing {DATA_PATH}"));
        let config_written = self
            .store
            .write(CONFIG_PATH, config.as_bytes())
            .with_context(|| format!("Writing {CONFIG_PATH}"));

        if data_written.is_ok() {
            info!("wrote {DATA_PATH}");
        }
        if config_written.is_ok() {
            info!("wrote {CONFIG_PATH}");
        }
        data_written.and(config_written)
    }
}

fn read_text(store: &dyn ProjectStore, path: &str) -> Result<String> {
    store
        .read_text(path)
        .with_context(|| format!("Reading {path}"))
}

/// PNG file names in `dir`, sorted.
fn list_pngs(store: &dyn ProjectStore, dir: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> = store
        .list(dir)
        .with_context(|| format!("Listing {dir}"))?
        .into_iter()
        .filter(|e| !e.is_dir && store::is_png_asset(&e.name))
        .map(|e| e.name)
        .collect();
    names.sort();
    Ok(names)
}

fn plan_jobs(store: &dyn ProjectStore, data: &TowerData) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();

    for entry in store
        .list(FLOORS_DIR)
        .with_context(|| format!("Listing {FLOORS_DIR}"))?
    {
        if entry.is_dir {
            continue;
        }
        let id = store::file_stem(&entry.name).to_string();
        jobs.push(Job::Floor(id, store::join(FLOORS_DIR, &entry.name)));
    }

    for kind in SheetKind::MATERIALS {
        let path = store::join(MATERIALS_DIR, &format!("{}.png", kind.name()));
        jobs.push(Job::Sheet(kind, path));
    }

    for name in list_pngs(store, AUTOTILES_DIR)? {
        let path = store::join(AUTOTILES_DIR, &name);
        jobs.push(Job::Autotile(store::file_stem(&name).to_string(), path));
    }

    // an explicit list fixes the extended-id order; otherwise file order
    let tilesets = match &data.main.tilesets {
        Some(names) => names.clone(),
        None => list_pngs(store, TILESETS_DIR)?,
    };
    for (index, name) in tilesets.into_iter().enumerate() {
        let path = store::join(TILESETS_DIR, &name);
        jobs.push(Job::Tileset(index, store::file_stem(&name).to_string(), path));
    }

    Ok(jobs)
}

fn run_job(store: &dyn ProjectStore, job: &Job) -> Result<Loaded> {
    match job {
        Job::Floor(id, path) => {
            let text = read_text(store, path)?;
            let grid =
                parser::parse_floor(&text).with_context(|| format!("Parsing floor {path}"))?;
            Ok(Loaded::Floor(id.clone(), grid))
        }
        Job::Sheet(kind, path) => Ok(Loaded::Sheet(*kind, decode(store, path)?)),
        Job::Autotile(name, path) => Ok(Loaded::Autotile(name.clone(), decode(store, path)?)),
        Job::Tileset(index, name, path) => {
            Ok(Loaded::Tileset(*index, name.clone(), decode(store, path)?))
        }
    }
}

fn decode(store: &dyn ProjectStore, path: &str) -> Result<RgbaImage> {
    let bytes = store
        .read(path)
        .with_context(|| format!("Reading {path}"))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| anyhow!("Decoding {path}: {e}"))?;
    Ok(image.to_rgba8())
}
