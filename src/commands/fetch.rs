//! Download story content into the local cache.

use super::workspace::Workspace;
use crate::story::{fetch_stories, STORY_COUNT};
use anyhow::anyhow;

pub async fn handle_fetch(selection: &str, with_images: bool, force: bool) -> Result<(), anyhow::Error> {
    let stories = parse_story_selection(selection)?;
    tracing::info!("=== obs2vid Fetch {} stories ===", stories.len());

    let workspace = Workspace::load()?;
    let downloaded = fetch_stories(&workspace.cache, &stories, with_images, force).await?;

    println!(
        "{} of {} stories downloaded into {}",
        downloaded,
        stories.len(),
        workspace.cache.content_dir().display()
    );
    if downloaded > 0 {
        println!("Run 'obs2vid catalog' to refresh the story catalog.");
    }
    Ok(())
}

/// Parses `all`, a single id, ranges and comma lists such as `1-5,7`.
pub fn parse_story_selection(selection: &str) -> Result<Vec<u32>, anyhow::Error> {
    let selection = selection.trim();
    if selection.eq_ignore_ascii_case("all") {
        return Ok((1..=STORY_COUNT).collect());
    }

    let mut stories = Vec::new();
    for part in selection.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let parse = |s: &str| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| anyhow!("Invalid story id '{s}'"))
        };
        let (start, end) = match part.split_once('-') {
            Some((start, end)) => (parse(start)?, parse(end)?),
            None => {
                let id = parse(part)?;
                (id, id)
            }
        };
        if start > end {
            return Err(anyhow!("Invalid story range '{part}'"));
        }
        for id in start..=end {
            if !(1..=STORY_COUNT).contains(&id) {
                return Err(anyhow!("Story {id} is out of range (1-{STORY_COUNT})"));
            }
            if !stories.contains(&id) {
                stories.push(id);
            }
        }
    }

    if stories.is_empty() {
        return Err(anyhow!("No stories selected"));
    }
    Ok(stories)
}
