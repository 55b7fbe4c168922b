use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

use ginka_tower::model::{Category, FloorTag, Membership};
use ginka_tower::parser;
use ginka_tower::processor::{NO_VALUE, SpriteAtlas};
use ginka_tower::store::{MemoryStore, ProjectStore, StoreEntry, StoreError};
use ginka_tower::tower::project::{CONFIG_PATH, DATA_PATH};
use ginka_tower::tower::{Status, Tower, TowerError, TowerEvent, Viewport};

const GRAY: Rgba<u8> = Rgba([90, 90, 90, 255]);
const RED: Rgba<u8> = Rgba([200, 20, 20, 255]);
const BLUE: Rgba<u8> = Rgba([20, 20, 200, 255]);
const PURPLE: Rgba<u8> = Rgba([120, 20, 120, 255]);
const TEAL: Rgba<u8> = Rgba([20, 160, 160, 255]);
const ORANGE: Rgba<u8> = Rgba([230, 140, 20, 255]);

fn png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

fn solid(w: u32, h: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(w, h, color)
}

fn atlas() -> SpriteAtlas {
    let mut sprites = BTreeMap::new();
    sprites.insert("0".to_string(), solid(32, 32, GRAY));
    sprites.insert("1".to_string(), solid(32, 32, RED));
    sprites.insert("3".to_string(), solid(32, 32, BLUE));
    sprites.insert("6".to_string(), solid(32, 32, BLUE));
    SpriteAtlas::new(sprites).unwrap()
}

fn floor_13(tile: u32, at: (usize, usize)) -> String {
    let mut grid = vec![vec![0u32; 13]; 13];
    grid[at.1][at.0] = tile;
    format!(
        "main.floors.MT1=\n{}",
        serde_json::json!({ "floorId": "MT1", "map": grid })
    )
}

fn fixture() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert(
        "data.js",
        "var data_a1e2fb4a_e986_4524_b0da_9b7ba7c0874d = \n{\"main\": {\"floorIds\": [\"MT0\", \"MT1\"], \"tilesets\": [\"extra.png\"], \"title\": \"demo\"}, \"firstData\": {\"hp\": 1000}}",
    );
    store.insert(
        "maps.js",
        "var maps_90f36752_8815_4be8_b32b_d7fad1d0542e = \n{\"1\": {\"id\": \"yellowWall\", \"cls\": \"terrains\"}, \"2\": {\"id\": \"bat\", \"cls\": \"enemy48\"}, \"5\": {\"id\": \"yellowDoor\", \"cls\": \"animates\"}, \"140\": {\"id\": \"water\", \"cls\": \"autotile\"}}",
    );
    store.insert(
        "icons.js",
        "var icons_4665ee12_3a1f_44a4_bea3_0fccba634dc1 = \n{\"hero\": {\"down\": {\"loc\": 0, \"stop\": 1}}, \"terrains\": {\"yellowWall\": 1}, \"enemy48\": {\"bat\": 0}, \"animates\": {\"yellowDoor\": 0}}",
    );
    store.insert(
        "ginka-config.json",
        r#"{
            "clip": { "defaults": [0, 0, 416, 416], "special": { "MT1": [32, 32, 352, 352] }, "unit": "px" },
            "data": {},
            "version": 2,
            "mapping": { "wall": [1], "door": [5], "redGem": [] }
        }"#,
    );
    store.insert("floors/MT0.js", "main.floors.MT0=\n{\"floorId\": \"MT0\", \"map\": [[1, 1], [5, 2]]}");
    store.insert("floors/MT1.js", floor_13(10001, (1, 1)));

    for name in ["terrains", "animates", "npcs", "npc48", "enemys", "items"] {
        store.insert(&format!("materials/{name}.png"), png(&solid(32, 64, TEAL)));
    }
    store.insert("materials/enemy48.png", png(&solid(32, 48, PURPLE)));

    store.insert("autotiles/water.png", png(&solid(96, 128, TEAL)));
    store.insert("autotiles/water_Highlight.png", b"not a png".to_vec());

    let mut extra = solid(64, 64, TEAL);
    for y in 0..32 {
        for x in 32..64 {
            extra.put_pixel(x, y, ORANGE);
        }
    }
    store.insert("tilesets/extra.png", png(&extra));
    store.insert("tilesets/unlisted.png", b"never read".to_vec());
    store
}

fn loaded(store: MemoryStore) -> Tower {
    let mut tower = Tower::new(atlas());
    tower.load(Box::new(store)).expect("fixture loads");
    tower
}

fn pixel_at_cell(frame: &RgbaImage, column: u32, row: u32) -> Rgba<u8> {
    *frame.get_pixel(column * 32 + 16, row * 32 + 16)
}

/// Copy the tower's persisted files over a fresh fixture.
fn reloadable(tower: &Tower) -> MemoryStore {
    let written = tower.project().unwrap().store();
    let mut store = fixture();
    for path in [DATA_PATH, CONFIG_PATH] {
        store.insert(path, written.read(path).unwrap());
    }
    store
}

#[test]
fn load_publishes_floor_sequence() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut tower = Tower::new(atlas());
    assert_eq!(tower.status(), Status::Unloaded);
    {
        let events = Arc::clone(&events);
        tower.subscribe(move |e| events.lock().unwrap().push(e.clone()));
    }

    tower.load(Box::new(fixture())).unwrap();

    assert_eq!(tower.status(), Status::Ready);
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            TowerEvent::FloorIdsChanged(vec!["MT0".into(), "MT1".into()]),
            TowerEvent::FloorChanged,
        ]
    );

    let project = tower.project().unwrap();
    assert_eq!(project.floors.len(), 2);
    assert_eq!(project.assets.autotiles.len(), 1, "highlight overlay skipped");
    assert_eq!(project.assets.tilesets.len(), 1, "only the listed tileset");
    assert_eq!(project.classification.value(5), 0, "array schema door");
    assert_eq!(project.classification.category_of(1), Some(Category::Wall));
}

#[test]
fn missing_asset_leaves_tower_unloaded() {
    let mut store = fixture();
    store.remove("materials/items.png");

    let mut tower = Tower::new(atlas());
    let err = tower.load(Box::new(store)).unwrap_err();
    assert!(format!("{err:#}").contains("materials/items.png"));
    assert_eq!(tower.status(), Status::Unloaded);
    assert_eq!(tower.project().err(), Some(TowerError::NotLoaded));
    assert_eq!(tower.mark_as(1, Category::Wall), Err(TowerError::NotLoaded));
}

#[test]
fn failed_reload_drops_previous_project() {
    let mut tower = loaded(fixture());

    let mut broken = fixture();
    broken.insert("tilesets/extra.png", b"garbage".to_vec());
    assert!(tower.load(Box::new(broken)).is_err());

    assert_eq!(tower.status(), Status::Unloaded);
    assert!(tower.frame().is_err());
}

#[test]
fn renders_and_rerenders_after_mutation() {
    let mut tower = loaded(fixture());

    let frame = tower.frame().unwrap().clone();
    assert_eq!(pixel_at_cell(&frame, 0, 0), RED, "wall from atlas");
    assert_eq!(pixel_at_cell(&frame, 0, 1), BLUE, "door tier 0");
    assert_eq!(pixel_at_cell(&frame, 1, 1), PURPLE, "unclassified bat from catalog");
    assert_eq!(*frame.get_pixel(48, 20), PURPLE, "48-tall sprite overhangs");
    assert_eq!(pixel_at_cell(&frame, 6, 6), GRAY);

    tower.mark_as(2, Category::RedGem).unwrap();
    let frame = tower.frame().unwrap().clone();
    assert_eq!(pixel_at_cell(&frame, 1, 1), BLUE, "red gem sprite");

    tower.unmark(1).unwrap();
    let frame = tower.frame().unwrap();
    assert_eq!(pixel_at_cell(frame, 0, 0), TEAL, "wall back to catalog sheet");
}

#[test]
fn extended_tiles_follow_listed_tileset_order() {
    let mut tower = loaded(fixture());
    tower.select_floor(1).unwrap();

    let frame = tower.frame().unwrap();
    assert_eq!(pixel_at_cell(frame, 1, 1), ORANGE);
    assert_eq!(pixel_at_cell(frame, 0, 0), GRAY);
}

#[test]
fn navigation_rejects_bad_indices() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut tower = loaded(fixture());
    {
        let events = Arc::clone(&events);
        tower.subscribe(move |e| events.lock().unwrap().push(e.clone()));
    }

    assert_eq!(
        tower.select_floor(2),
        Err(TowerError::FloorOutOfRange { index: 2, len: 2 })
    );
    assert_eq!(tower.active_index().unwrap(), 0);

    tower.select_floor(1).unwrap();
    assert_eq!(tower.active_grid().unwrap().unwrap().len(), 13);
    assert_eq!(*events.lock().unwrap(), vec![TowerEvent::FloorChanged]);
}

#[test]
fn removing_from_sequence_keeps_floor_data() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut tower = loaded(fixture());
    {
        let events = Arc::clone(&events);
        tower.subscribe(move |e| events.lock().unwrap().push(e.clone()));
    }

    assert_eq!(tower.remove_from_sequence(0).unwrap(), "MT0");
    assert_eq!(tower.floor_ids().unwrap(), ["MT1".to_string()]);
    assert!(tower.project().unwrap().floors.contains_key("MT0"));
    assert_eq!(
        *events.lock().unwrap(),
        vec![TowerEvent::FloorIdsChanged(vec!["MT1".into()])]
    );
    assert!(tower.remove_from_sequence(5).is_err());

    tower.persist().unwrap();
    let data = parser::parse_data(
        &tower.project().unwrap().store().read_text(DATA_PATH).unwrap(),
    )
    .unwrap();
    assert_eq!(data.main.floor_ids, vec!["MT1"]);
}

#[test]
fn persist_round_trips_classification() {
    let mut tower = loaded(fixture());
    tower.mark_as(2, Category::RedGem).unwrap();
    assert!(tower.update_value(5, 3).unwrap());
    assert!(!tower.update_value(1, 3).unwrap(), "walls carry no value");
    tower.persist().unwrap();

    let store = tower.project().unwrap().store();
    let config = parser::parse_config(&store.read_text(CONFIG_PATH).unwrap()).unwrap();
    match &config.mapping["door"] {
        Membership::Levels(levels) => assert_eq!(levels["5"], 3),
        other => panic!("door written as {other:?}"),
    }
    assert_eq!(config.mapping["wall"], Membership::Ids(vec![1]));
    assert_eq!(config.clip.special["MT1"], [32, 32, 352, 352]);

    let data_js = store.read_text(DATA_PATH).unwrap();
    assert!(data_js.starts_with("var data_a1e2fb4a_e986_4524_b0da_9b7ba7c0874d = \n"));
    assert!(data_js.contains("\"title\": \"demo\""));
    assert!(data_js.contains("\"firstData\""));

    let again = loaded(reloadable(&tower));
    let classification = again.classification().unwrap();
    assert_eq!(classification, tower.classification().unwrap());
    assert_eq!(classification.value(5), 3);
    assert_eq!(classification.value(1), NO_VALUE);
    assert_eq!(classification.category_of(2), Some(Category::RedGem));
}

#[test]
fn persist_without_changes_is_semantically_stable() {
    let mut tower = loaded(fixture());
    tower.persist().unwrap();
    let first = tower.project().unwrap().config();

    let mut again = loaded(reloadable(&tower));
    again.persist().unwrap();
    let second = again.project().unwrap().config();

    assert_eq!(first.mapping, second.mapping);
    assert_eq!(first.clip, second.clip);
    assert_eq!(first.data, second.data);
    assert_eq!(second.rest["version"], serde_json::json!(2));
    assert_eq!(second.clip.rest["unit"], serde_json::json!("px"));
}

#[test]
fn floor_tags_are_created_on_first_write() {
    let mut tower = loaded(fixture());
    tower.select_floor(1).unwrap();
    assert_eq!(tower.floor_tag().unwrap(), FloorTag::default());
    assert!(!tower.project().unwrap().floor_data.contains_key("MT1"));

    let tag: FloorTag = "101".parse().unwrap();
    tower.set_floor_tag(tag).unwrap();
    assert_eq!(tower.floor_tag().unwrap(), tag);

    tower.select_floor(0).unwrap();
    assert_eq!(tower.floor_tag().unwrap(), FloorTag::default());

    tower.persist().unwrap();
    let again = loaded(reloadable(&tower));
    let bits = &again.project().unwrap().floor_data["MT1"].tag;
    assert_eq!(bits.len(), 64);
    assert_eq!(&bits[..3], &[1, 0, 1]);
}

#[test]
fn click_publishes_grid_cell() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut tower = loaded(fixture());
    {
        let events = Arc::clone(&events);
        tower.subscribe(move |e| events.lock().unwrap().push(e.clone()));
    }

    let viewport = Viewport::fit(832.0, 900.0, 1.0);
    assert_eq!(tower.click(&viewport, 70.0, 130.0), Some((1, 2)));
    assert_eq!(
        *events.lock().unwrap(),
        vec![TowerEvent::BlockClicked { x: 1, y: 2 }]
    );
}

/// Refuses writes to one path, otherwise behaves like its inner store.
struct FailingWrites {
    inner: MemoryStore,
    refuse: &'static str,
}

impl ProjectStore for FailingWrites {
    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.inner.read(path)
    }

    fn write(&mut self, path: &str, contents: &[u8]) -> Result<(), StoreError> {
        if path == self.refuse {
            return Err(StoreError::Io {
                path: path.to_string(),
                source: std::io::Error::other("read-only"),
            });
        }
        self.inner.write(path, contents)
    }

    fn list(&self, dir: &str) -> Result<Vec<StoreEntry>, StoreError> {
        self.inner.list(dir)
    }
}

#[test]
fn persist_attempts_both_writes() {
    let mut tower = Tower::new(atlas());
    tower
        .load(Box::new(FailingWrites {
            inner: fixture(),
            refuse: DATA_PATH,
        }))
        .unwrap();
    tower.mark_as(2, Category::Wall).unwrap();

    let err = tower.persist().unwrap_err();
    assert!(format!("{err:#}").contains(DATA_PATH));

    let store = tower.project().unwrap().store();
    let config = parser::parse_config(&store.read_text(CONFIG_PATH).unwrap()).unwrap();
    assert_eq!(config.mapping["wall"], Membership::Ids(vec![1, 2]));
}
