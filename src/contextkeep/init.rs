//! Store construction and data-directory resolution.
//!
//! Both front-ends share one [`MemoryStore`] built here at startup; nothing
//! else in the crate decides where records live.

use crate::error::{KeepError, Result};
use crate::store::MemoryStore;
use directories::ProjectDirs;
use std::path::PathBuf;

pub fn default_data_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "contextkeep", "contextkeep")
        .ok_or_else(|| KeepError::Store("Could not determine data directory".to_string()))?;
    Ok(proj_dirs.data_dir().join("memories"))
}

/// Open the store, preferring an explicit override to the platform default.
pub fn open_store(data_dir: Option<PathBuf>) -> Result<MemoryStore> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    log::info!("memory store at {}", dir.display());
    MemoryStore::open(dir)
}
