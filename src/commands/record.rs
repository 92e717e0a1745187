//! Narrate one story section.
//!
//! Shows the section text with a live input meter. Enter (or SIGUSR1 from an
//! external trigger) stops and keeps the take; Escape cancels it and leaves
//! any earlier take in place.

use super::workspace::{check_story_id, section_display, Workspace};
use crate::recorder::session::{self, ButtonStates, VisualState};
use crate::recorder::StartOptions;
use crate::recordings::RecordingEntry;
use crate::ui::{SectionCommand, SectionTui, SectionView};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub async fn handle_record(story_id: u32, section_index: u32) -> Result<(), anyhow::Error> {
    tracing::info!("=== obs2vid Record {}:{} ===", story_id, section_index);
    check_story_id(story_id)?;

    let workspace = Workspace::load()?;
    let catalog = workspace.catalog();
    let (title, text) = section_display(catalog.as_ref(), story_id, section_index)?;
    let mut store = workspace.store();
    let mut recorder = workspace.recorder();

    if !recorder.can_record() {
        return Err(anyhow::anyhow!(
            "No audio input device available. Run 'obs2vid list-devices' and check [audio] device."
        ));
    }
    if store.get_recording(story_id, section_index)?.is_some() {
        println!("{story_id}:{section_index} already has a take; it is replaced only if you keep this one.");
    }

    let options = StartOptions::from(&workspace.config.audio);
    tracing::info!(
        "Recording with device={}, sample_rate={}Hz, channels={}, bit_rate={}",
        workspace.config.audio.device,
        options.sample_rate,
        options.channels,
        options.bit_rate
    );
    let path =
        session::start_section_recording(&mut recorder, story_id, section_index, options).await?;

    let trigger = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&trigger))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut tui = SectionTui::new()?;
    let started = Instant::now();
    let keep = loop {
        if trigger.load(Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: saving via external trigger");
            break true;
        }

        tui.render(&SectionView {
            title: &title,
            text: &text,
            state: VisualState::derive(true, false, true),
            buttons: ButtonStates::derive(true, false, true),
            level_db: recorder.metering(),
            elapsed: started.elapsed(),
        })?;

        match tui.handle_input()? {
            SectionCommand::Confirm => break true,
            SectionCommand::Cancel => break false,
            SectionCommand::Continue | SectionCommand::Retake => {}
        }
    };
    tui.cleanup()?;

    if !keep {
        session::cancel_section_recording(&mut recorder)?;
        tracing::info!("Recording {}:{} cancelled", story_id, section_index);
        println!("Recording cancelled; any earlier take is unchanged.");
        return Ok(());
    }

    let outcome = session::stop_section_recording(&mut recorder)?;
    store.set_recording(&RecordingEntry::new(
        story_id,
        section_index,
        outcome.path.clone(),
        outcome.duration_ms,
    ))?;
    println!(
        "Saved {}:{} ({:.1}s) to {}",
        story_id,
        section_index,
        outcome.duration_ms / 1000.0,
        path.display()
    );

    Ok(())
}
