//! The orchestrator: owns the loaded project, routes annotator mutations
//! into the classification, and keeps the rendered frame current.
pub mod events;
pub mod project;
pub mod viewport;

use anyhow::Result;
use image::RgbaImage;
use log::{debug, warn};
use thiserror::Error;

use crate::model::{Category, FloorGrid, FloorTag};
use crate::processor::{ClassificationMap, Mark, RenderEngine, SpriteAtlas};
use crate::store::ProjectStore;

pub use events::{EventBus, TowerEvent};
pub use project::Project;
pub use viewport::Viewport;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TowerError {
    #[error("no project is loaded")]
    NotLoaded,

    #[error("floor index {index} out of range (0..{len})")]
    FloorOutOfRange { index: usize, len: usize },

    #[error("the active floor index points past the floor list")]
    NoActiveFloor,
}

/// Lifecycle of the tower. `load` holds the tower mutably for its whole
/// run, so callers only ever observe `Unloaded` or `Ready`; `Loading` is
/// the state in force while that call is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unloaded,
    Loading,
    Ready,
}

enum State {
    Unloaded,
    Loading,
    Ready(Box<Project>),
}

pub struct Tower {
    atlas: SpriteAtlas,
    state: State,
    events: EventBus,
    /// Last rendered frame; `None` once anything it depends on changed.
    frame: Option<RgbaImage>,
}

impl Tower {
    pub fn new(atlas: SpriteAtlas) -> Self {
        Self {
            atlas,
            state: State::Unloaded,
            events: EventBus::new(),
            frame: None,
        }
    }

    pub fn status(&self) -> Status {
        match self.state {
            State::Unloaded => Status::Unloaded,
            State::Loading => Status::Loading,
            State::Ready(_) => Status::Ready,
        }
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&TowerEvent) + Send + 'static) {
        self.events.subscribe(subscriber);
    }

    /// Replace the current project with the one in `store`. On failure the
    /// tower is left unloaded.
    pub fn load(&mut self, store: Box<dyn ProjectStore>) -> Result<()> {
        self.state = State::Loading;
        self.frame = None;

        match Project::load(store) {
            Ok(project) => {
                let ids = project.floor_ids().to_vec();
                self.state = State::Ready(Box::new(project));
                self.events.emit(TowerEvent::FloorIdsChanged(ids));
                self.events.emit(TowerEvent::FloorChanged);
                Ok(())
            }
            Err(e) => {
                self.state = State::Unloaded;
                Err(e)
            }
        }
    }

    pub fn project(&self) -> Result<&Project, TowerError> {
        match &self.state {
            State::Ready(project) => Ok(&**project),
            _ => Err(TowerError::NotLoaded),
        }
    }

    fn project_mut(&mut self) -> Result<&mut Project, TowerError> {
        match &mut self.state {
            State::Ready(project) => Ok(&mut **project),
            _ => Err(TowerError::NotLoaded),
        }
    }

    /// Every mutator funnels through here so the next `frame` redraws.
    fn request_render(&mut self) {
        self.frame = None;
    }

    // ─────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────

    pub fn floor_ids(&self) -> Result<&[String], TowerError> {
        Ok(self.project()?.floor_ids())
    }

    pub fn active_index(&self) -> Result<usize, TowerError> {
        Ok(self.project()?.cursor)
    }

    pub fn active_grid(&self) -> Result<Option<&FloorGrid>, TowerError> {
        Ok(self.project()?.active_grid())
    }

    pub fn select_floor(&mut self, index: usize) -> Result<(), TowerError> {
        let project = self.project_mut()?;
        let len = project.floor_ids().len();
        if index >= len {
            return Err(TowerError::FloorOutOfRange { index, len });
        }
        project.cursor = index;
        self.events.emit(TowerEvent::FloorChanged);
        self.request_render();
        Ok(())
    }

    /// Drop a floor from the sequence (its grid stays loaded). The cursor
    /// is left alone.
    pub fn remove_from_sequence(&mut self, index: usize) -> Result<String, TowerError> {
        let project = self.project_mut()?;
        let ids = &mut project.data.main.floor_ids;
        if index >= ids.len() {
            return Err(TowerError::FloorOutOfRange {
                index,
                len: ids.len(),
            });
        }
        let removed = ids.remove(index);
        let ids = ids.clone();
        debug!("removed floor `{removed}` from the sequence");
        self.events.emit(TowerEvent::FloorIdsChanged(ids));
        self.request_render();
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────
    // Classification
    // ─────────────────────────────────────────────────────

    pub fn classification(&self) -> Result<&ClassificationMap, TowerError> {
        Ok(&self.project()?.classification)
    }

    pub fn mark_as(&mut self, tile: u32, category: Category) -> Result<(), TowerError> {
        self.project_mut()?.classification.mark_as(tile, category);
        self.request_render();
        Ok(())
    }

    pub fn unmark(&mut self, tile: u32) -> Result<Option<Mark>, TowerError> {
        let previous = self.project_mut()?.classification.unmark(tile);
        self.request_render();
        Ok(previous)
    }

    /// `Ok(false)` when the tile has no value to update.
    pub fn update_value(&mut self, tile: u32, value: i64) -> Result<bool, TowerError> {
        let updated = self
            .project_mut()?
            .classification
            .update_value(tile, value);
        if !updated {
            warn!("tile {tile} is not in a leveled category, value ignored");
        }
        self.request_render();
        Ok(updated)
    }

    // ─────────────────────────────────────────────────────
    // Floor tags
    // ─────────────────────────────────────────────────────

    pub fn floor_tag(&self) -> Result<FloorTag, TowerError> {
        let project = self.project()?;
        let id = project.active_floor_id().ok_or(TowerError::NoActiveFloor)?;
        Ok(project.floor_tag(id))
    }

    pub fn set_floor_tag(&mut self, tag: FloorTag) -> Result<(), TowerError> {
        let project = self.project_mut()?;
        let id = project
            .active_floor_id()
            .ok_or(TowerError::NoActiveFloor)?
            .to_string();
        project.set_floor_tag(&id, tag);
        Ok(())
    }

    // ─────────────────────────────────────────────────────
    // Output
    // ─────────────────────────────────────────────────────

    /// Translate a pointer offset into a grid cell and publish it.
    pub fn click(&mut self, viewport: &Viewport, offset_x: f64, offset_y: f64) -> Option<(i32, i32)> {
        let (x, y) = viewport.cell_at(offset_x, offset_y)?;
        self.events.emit(TowerEvent::BlockClicked { x, y });
        Some((x, y))
    }

    /// Render the active floor from scratch.
    pub fn render(&self) -> Result<RgbaImage, TowerError> {
        let project = self.project()?;
        Ok(render_project(project, &self.atlas))
    }

    /// The active floor's frame, redrawn only after a change.
    pub fn frame(&mut self) -> Result<&RgbaImage, TowerError> {
        let project = match &self.state {
            State::Ready(project) => project,
            _ => return Err(TowerError::NotLoaded),
        };
        let atlas = &self.atlas;
        Ok(self
            .frame
            .get_or_insert_with(|| render_project(project, atlas)))
    }

    pub fn persist(&mut self) -> Result<()> {
        Ok(self.project_mut()?.persist()?)
    }
}

fn render_project(project: &Project, atlas: &SpriteAtlas) -> RgbaImage {
    let engine = RenderEngine {
        classification: &project.classification,
        catalog: &project.catalog,
        atlas,
        assets: &project.assets,
    };
    engine.render_floor(project.active_grid().map(Vec::as_slice))
}
