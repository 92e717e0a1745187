//! List stories known to the catalog.

use super::workspace::Workspace;
use anyhow::anyhow;

pub fn handle_stories() -> Result<(), anyhow::Error> {
    let workspace = Workspace::load()?;
    let catalog = workspace
        .catalog()
        .ok_or_else(|| anyhow!("No catalog found. Run 'obs2vid fetch all' and 'obs2vid catalog' first."))?;

    for story in &catalog.stories {
        println!("{:>2}  {}  ({} sections)", story.id, story.title, story.sections.len());
    }
    Ok(())
}
