//! Storage locations for narration audio and application data.
//!
//! Data lives under `~/.local/share/obs2vid`; recordings are named after the
//! story and section they narrate so a retake overwrites the same file.

use anyhow::anyhow;
use std::path::{Path, PathBuf};

/// `obs-en-SS-II.m4a` for a story/section pair.
pub fn audio_basename(story_id: u32, section_index: u32) -> String {
    format!("obs-en-{story_id:02}-{section_index:02}.m4a")
}

/// Recording location relative to the data directory.
pub fn audio_relative_path(story_id: u32, section_index: u32) -> String {
    format!("recordings/{}", audio_basename(story_id, section_index))
}

/// Returns the application data directory, creating it if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the directory cannot be created
pub fn data_dir() -> Result<PathBuf, anyhow::Error> {
    let dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("obs2vid");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Resolves `relative` against `base` and makes sure its parent directory exists.
///
/// Absolute paths are returned unchanged; a leading `/` on a `file://` URI is kept.
pub fn resolve_under(base: &Path, relative: &str) -> std::io::Result<PathBuf> {
    let resolved = match relative.strip_prefix("file://") {
        Some(path) => PathBuf::from(path),
        None if Path::new(relative).is_absolute() => PathBuf::from(relative),
        None => base.join(relative),
    };
    if let Some(parent) = resolved.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(resolved)
}
