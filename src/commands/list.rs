//! Show narration progress for a story.

use super::workspace::{check_story_id, Workspace};
use crate::recorder::session::VisualState;
use crate::recordings::RecordingEntry;
use crate::story::Story;

const EXCERPT_CHARS: usize = 48;

pub fn handle_list(story_id: u32) -> Result<(), anyhow::Error> {
    check_story_id(story_id)?;
    let workspace = Workspace::load()?;
    let recordings = workspace.store().recordings_for_story(story_id)?;
    let catalog = workspace.catalog();
    let story = catalog.as_ref().and_then(|c| c.story(story_id));

    for line in progress_lines(story_id, story, &recordings) {
        println!("{line}");
    }
    Ok(())
}

/// One line per section; without a catalog, only recorded sections are known.
fn progress_lines(story_id: u32, story: Option<&Story>, recordings: &[RecordingEntry]) -> Vec<String> {
    let find = |index: u32| recordings.iter().find(|r| r.index == index);
    let status = |entry: Option<&RecordingEntry>| {
        let state = VisualState::derive(false, false, entry.is_some());
        match entry {
            Some(entry) => format!("{:>6.1}s  {}", entry.duration_ms / 1000.0, state.label()),
            None => format!("{:>7}  {}", "-", state.label()),
        }
    };

    let mut lines = Vec::new();
    match story {
        Some(story) => {
            lines.push(story.title.clone());
            for section in &story.sections {
                lines.push(format!(
                    "  {:>2}  {}  {}",
                    section.index,
                    status(find(section.index)),
                    excerpt(&section.text)
                ));
            }
            let recorded = story
                .sections
                .iter()
                .filter(|s| find(s.index).is_some())
                .count();
            lines.push(format!("{recorded}/{} sections recorded", story.sections.len()));
        }
        None => {
            lines.push(format!("Story {story_id:02}"));
            for entry in recordings {
                lines.push(format!("  {:>2}  {}", entry.index, status(Some(entry))));
            }
            lines.push(format!(
                "{} sections recorded (run 'obs2vid catalog' to see all sections)",
                recordings.len()
            ));
        }
    }
    lines
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(EXCERPT_CHARS - 1).collect();
        format!("{cut}…")
    }
}
