pub mod cli;
pub mod model;
pub mod parser;
pub mod processor;
pub mod store;
pub mod tower;
pub mod writer;

use anyhow::{Context, anyhow};
use clap::Parser;
use log::debug;

use crate::cli::Command;
use crate::processor::SpriteAtlas;
use crate::store::DirStore;
use crate::tower::{Tower, Viewport};

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // 1. ── Load ───────────────────────────────────────────────────────
    let atlas = SpriteAtlas::load(&DirStore::new(&args.tiles))
        .with_context(|| format!("Loading sprite atlas from {}", args.tiles.display()))?;
    let mut tower = Tower::new(atlas);
    tower.subscribe(|event| debug!("{event:?}"));

    let project_dir = args.game.join("project");
    tower
        .load(Box::new(DirStore::new(&project_dir)))
        .with_context(|| format!("Loading {}", project_dir.display()))?;

    // 2. ── Run the command ────────────────────────────────────────────
    execute(&mut tower, args.command)
}

fn execute(tower: &mut Tower, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Floors => {
            let active = tower.active_index()?;
            for (i, id) in tower.floor_ids()?.iter().enumerate() {
                let marker = if i == active { "*" } else { " " };
                println!("{marker}{i:>4}  {id}");
            }
        }
        Command::Render { floor, out, size } => {
            tower.select_floor(floor)?;
            let frame = tower.frame()?;
            writer::png::save_frame(frame, &out, size)?;
            println!("wrote {}", out.display());
        }
        Command::Inspect { tile } => {
            let project = tower.project()?;
            match project.classification.get(tile) {
                Some(mark) => match mark.level {
                    Some(level) => println!("{tile}: {} (value {level})", mark.category),
                    None => println!("{tile}: {}", mark.category),
                },
                None => println!("{tile}: unclassified"),
            }
            if let Some(entry) = project.catalog.entry(tile) {
                println!("  catalog: {} / {}", entry.cls, entry.id);
            }
            match project.catalog.resolve(tile, &project.assets) {
                Some(sprite) => {
                    let r = sprite.rect;
                    println!("  source: {}x{} at ({}, {})", r.width, r.height, r.x, r.y);
                }
                None => println!("  source: none"),
            }
        }
        Command::Mark {
            tile,
            category,
            value,
        } => {
            tower.mark_as(tile, category)?;
            if let Some(value) = value {
                if !tower.update_value(tile, value)? {
                    return Err(anyhow!("`{category}` does not carry a value"));
                }
            }
            tower.persist()?;
        }
        Command::Unmark { tile } => {
            if tower.unmark(tile)?.is_none() {
                println!("{tile} was not classified");
            }
            tower.persist()?;
        }
        Command::SetValue { tile, value } => {
            if tower.update_value(tile, value)? {
                tower.persist()?;
            }
        }
        Command::DropFloor { index } => {
            let removed = tower.remove_from_sequence(index)?;
            tower.persist()?;
            println!("removed {removed}");
        }
        Command::Tag { floor, set } => {
            tower.select_floor(floor)?;
            if let Some(tag) = set {
                tower.set_floor_tag(tag)?;
                tower.persist()?;
            }
            println!("{}", tower.floor_tag()?);
        }
        Command::Pick { floor, size, x, y } => {
            tower.select_floor(floor)?;
            let viewport = Viewport::fit(size, size, 1.0);
            let (column, row) = tower
                .click(&viewport, x, y)
                .ok_or_else(|| anyhow!("canvas size must be positive"))?;
            let tile = tower.active_grid()?.and_then(|grid| {
                let row = usize::try_from(row).ok()?;
                let column = usize::try_from(column).ok()?;
                grid.get(row)?.get(column).copied()
            });
            match tile {
                Some(tile) => println!("({column}, {row}): {tile}"),
                None => println!("({column}, {row}): off the floor"),
            }
        }
    }
    Ok(())
}
