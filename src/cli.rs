use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::{Category, FloorTag};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Game directory (the one containing `project/`)
    pub game: PathBuf,
    /// Directory holding the fixed sprite atlas (`0.png`, `1.png`, ...)
    #[arg(long, default_value = "tiles")]
    pub tiles: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the floor sequence
    Floors,
    /// Render one floor to a PNG file
    Render {
        #[arg(long, default_value_t = 0)]
        floor: usize,
        #[arg(long)]
        out: PathBuf,
        /// Output side in pixels (nearest-neighbour scaled)
        #[arg(long)]
        size: Option<u32>,
    },
    /// Show how a tile id is classified and drawn
    Inspect { tile: u32 },
    /// Classify a tile id
    Mark {
        tile: u32,
        category: Category,
        /// Initial value for leveled categories
        #[arg(long, allow_hyphen_values = true)]
        value: Option<i64>,
    },
    /// Remove a tile id from every category
    Unmark { tile: u32 },
    /// Set the value of a leveled tile
    SetValue {
        tile: u32,
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },
    /// Drop a floor from the sequence
    DropFloor { index: usize },
    /// Show or set a floor's 64-bit tag
    Tag {
        #[arg(long, default_value_t = 0)]
        floor: usize,
        /// Bits as a 0/1 string, zero-padded to 64
        #[arg(long)]
        set: Option<FloorTag>,
    },
    /// Translate a pointer position on a square canvas into a grid cell
    Pick {
        #[arg(long, default_value_t = 0)]
        floor: usize,
        /// Canvas side in layout pixels
        #[arg(long, default_value_t = 416.0)]
        size: f64,
        x: f64,
        y: f64,
    },
}
