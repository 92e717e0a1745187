//! Listen back to a section's take.
//!
//! Enter or Escape stops playback; 'r' discards the take so the section can be
//! recorded again.

use super::workspace::{check_story_id, section_display, Workspace};
use crate::recorder::session::{self, ButtonStates, VisualState};
use crate::recorder::IDLE_METER_DB;
use crate::ui::{SectionCommand, SectionTui, SectionView};
use anyhow::anyhow;
use std::time::Instant;

pub fn handle_play(story_id: u32, section_index: u32) -> Result<(), anyhow::Error> {
    tracing::info!("=== obs2vid Play {}:{} ===", story_id, section_index);
    check_story_id(story_id)?;

    let workspace = Workspace::load()?;
    let catalog = workspace.catalog();
    let (title, text) = section_display(catalog.as_ref(), story_id, section_index)?;
    let mut store = workspace.store();

    let entry = store.get_recording(story_id, section_index)?.ok_or_else(|| {
        anyhow!(
            "No recording for {story_id}:{section_index}. Record it with 'obs2vid record {story_id} {section_index}'."
        )
    })?;
    if !entry.audio_path.exists() {
        return Err(anyhow!(
            "Audio file not found: {}",
            entry.audio_path.display()
        ));
    }

    let mut recorder = workspace.recorder();
    session::play_section_recording(&mut recorder, &entry.audio_path)?;

    let mut tui = SectionTui::new()?;
    let started = Instant::now();
    let mut retaken = false;
    while recorder.is_playing() {
        tui.render(&SectionView {
            title: &title,
            text: &text,
            state: VisualState::derive(false, true, true),
            buttons: ButtonStates::derive(false, true, true),
            level_db: IDLE_METER_DB,
            elapsed: started.elapsed(),
        })?;

        match tui.handle_input()? {
            SectionCommand::Confirm | SectionCommand::Cancel => {
                session::stop_playback(&mut recorder)?;
            }
            SectionCommand::Retake => {
                session::retake_section_recording(&mut recorder, &entry.audio_path);
                store.remove_recording(story_id, section_index)?;
                retaken = true;
            }
            SectionCommand::Continue => {}
        }
    }
    tui.cleanup()?;

    if retaken {
        println!("Take for {story_id}:{section_index} discarded. Record it again with 'obs2vid record {story_id} {section_index}'.");
    }
    tracing::info!("Playback of {}:{} finished", story_id, section_index);
    Ok(())
}
