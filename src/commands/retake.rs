//! Discard a section's take.

use super::workspace::{check_story_id, Workspace};
use crate::paths::audio_relative_path;
use crate::recorder::session;

/// Removes the stored recording and its audio file. Succeeds when there is nothing to remove.
pub fn handle_retake(story_id: u32, section_index: u32) -> Result<(), anyhow::Error> {
    tracing::info!("=== obs2vid Retake {}:{} ===", story_id, section_index);
    check_story_id(story_id)?;

    let workspace = Workspace::load()?;
    let mut store = workspace.store();
    let mut recorder = workspace.recorder();

    let path = match store.get_recording(story_id, section_index)? {
        Some(entry) => entry.audio_path,
        None => recorder.resolve_path(&audio_relative_path(story_id, section_index))?,
    };
    session::retake_section_recording(&mut recorder, &path);

    if store.remove_recording(story_id, section_index)? {
        println!("Discarded take for {story_id}:{section_index}.");
    } else {
        println!("No take recorded for {story_id}:{section_index}.");
    }
    Ok(())
}
