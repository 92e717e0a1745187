//! Build the story catalog from cached content.

use super::workspace::Workspace;
use crate::story::Catalog;

pub fn handle_catalog() -> Result<(), anyhow::Error> {
    tracing::info!("=== obs2vid Catalog ===");
    let workspace = Workspace::load()?;

    let catalog = Catalog::build(&workspace.cache)?;
    let path = workspace.catalog_path();
    catalog.save(&path)?;

    let sections: usize = catalog.stories.iter().map(|s| s.sections.len()).sum();
    println!(
        "Catalog with {} stories ({} sections) written to {}",
        catalog.stories.len(),
        sections,
        path.display()
    );
    Ok(())
}
