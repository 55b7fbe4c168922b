//! Directory-like blob storage the tower reads its project from.
//!
//! Paths are `/`-separated and relative to the store root
//! (`floors/MT0.js`, `materials/items.png`, ...). The root itself is `""`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("`{0}` not found")]
    NotFound(String),

    #[error("`{0}` is not a directory")]
    NotADirectory(String),

    #[error("`{0}` is not valid UTF-8")]
    NotText(String),

    #[error("I/O error on `{path}`")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub name: String,
    pub is_dir: bool,
}

pub trait ProjectStore: Send + Sync {
    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    fn write(&mut self, path: &str, contents: &[u8]) -> Result<(), StoreError>;

    /// Direct children of `dir`, files and sub-directories alike.
    fn list(&self, dir: &str) -> Result<Vec<StoreEntry>, StoreError>;

    fn read_text(&self, path: &str) -> Result<String, StoreError> {
        String::from_utf8(self.read(path)?).map_err(|_| StoreError::NotText(path.to_string()))
    }
}

/// Joins a directory and a child name into a store path.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// File name without its last extension.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Image assets are `.png` files that are not editor `_Highlight` overlays.
pub fn is_png_asset(name: &str) -> bool {
    let mut parts = name.rsplitn(2, '.');
    let (Some(ext), Some(stem)) = (parts.next(), parts.next()) else {
        return false;
    };
    ext == "png" && !stem.ends_with("_Highlight")
}

// ─────────────────────────────────────────────────────
// File system
// ─────────────────────────────────────────────────────

/// A store backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

fn io_error(path: &str, source: io::Error) -> StoreError {
    if source.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(path.to_string())
    } else {
        StoreError::Io {
            path: path.to_string(),
            source,
        }
    }
}

impl ProjectStore for DirStore {
    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        fs::read(self.resolve(path)).map_err(|e| io_error(path, e))
    }

    fn write(&mut self, path: &str, contents: &[u8]) -> Result<(), StoreError> {
        fs::write(self.resolve(path), contents).map_err(|e| io_error(path, e))
    }

    fn list(&self, dir: &str) -> Result<Vec<StoreEntry>, StoreError> {
        let full = self.resolve(dir);
        if full.is_file() {
            return Err(StoreError::NotADirectory(dir.to_string()));
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| io_error(dir, e))? {
            let entry = entry.map_err(|e| io_error(dir, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| io_error(dir, e))?
                .is_dir();
            entries.push(StoreEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

// ─────────────────────────────────────────────────────
// In memory
// ─────────────────────────────────────────────────────

/// A store held entirely in memory; directories exist once something was
/// put inside them.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, contents: impl Into<Vec<u8>>) {
        self.register_parents(path);
        self.files.insert(path.to_string(), contents.into());
    }

    pub fn create_dir(&mut self, path: &str) {
        self.register_parents(path);
        self.dirs.insert(path.trim_end_matches('/').to_string());
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    fn register_parents(&mut self, path: &str) {
        let mut parent = path;
        while let Some(idx) = parent.rfind('/') {
            parent = &parent[..idx];
            self.dirs.insert(parent.to_string());
        }
    }
}

impl ProjectStore for MemoryStore {
    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn write(&mut self, path: &str, contents: &[u8]) -> Result<(), StoreError> {
        if self.dirs.contains(path) {
            return Err(StoreError::NotADirectory(path.to_string()));
        }
        self.insert(path, contents);
        Ok(())
    }

    fn list(&self, dir: &str) -> Result<Vec<StoreEntry>, StoreError> {
        let dir = dir.trim_end_matches('/');
        if self.files.contains_key(dir) {
            return Err(StoreError::NotADirectory(dir.to_string()));
        }
        if !dir.is_empty() && !self.dirs.contains(dir) {
            return Err(StoreError::NotFound(dir.to_string()));
        }
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let children = |path: &String| -> Option<String> {
            let rest = path.strip_prefix(&prefix)?;
            (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
        };

        let mut entries: Vec<StoreEntry> = self
            .dirs
            .iter()
            .filter_map(&children)
            .map(|name| StoreEntry { name, is_dir: true })
            .chain(
                self.files
                    .keys()
                    .filter_map(&children)
                    .map(|name| StoreEntry { name, is_dir: false }),
            )
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
