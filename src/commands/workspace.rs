//! Shared setup for commands: configuration, data locations, store and recorder.

use crate::config::Obs2vidConfig;
use crate::paths;
use crate::recorder::{ConsolePermissions, CpalCapture, PermissionBroker, Recorder, SystemPlayer};
use crate::recordings::RecordingStore;
use crate::story::{Catalog, ContentCache, Section, STORY_COUNT};
use anyhow::anyhow;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Workspace {
    pub config: Obs2vidConfig,
    pub data_dir: PathBuf,
    pub cache: ContentCache,
}

impl Workspace {
    /// Loads configuration and resolves data locations.
    ///
    /// # Errors
    /// - If the configuration cannot be loaded
    /// - If the data directory cannot be created
    pub fn load() -> anyhow::Result<Self> {
        let config = Obs2vidConfig::load().map_err(|e| {
            tracing::error!("Failed to load configuration: {e}");
            anyhow!("Configuration error: {e}\nPlease check ~/.config/obs2vid/obs2vid.toml")
        })?;
        let data_dir = paths::data_dir()?;
        let cache = ContentCache::new(config.cache_dir(&data_dir));
        tracing::debug!(
            "Workspace: data={}, cache={}",
            data_dir.display(),
            cache.root().display()
        );
        Ok(Self {
            config,
            data_dir,
            cache,
        })
    }

    pub fn store(&self) -> RecordingStore {
        RecordingStore::new(&self.data_dir)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.cache.root().join("catalog.json")
    }

    /// The saved catalog, if one has been built.
    pub fn catalog(&self) -> Option<Catalog> {
        match Catalog::load(&self.catalog_path()) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::debug!("No catalog available: {}", e);
                None
            }
        }
    }

    pub fn recorder(&self) -> Recorder<CpalCapture, SystemPlayer> {
        let permissions =
            PermissionBroker::new(Arc::new(ConsolePermissions::new(&self.data_dir)));
        Recorder::new(
            CpalCapture::new(self.config.audio.device.clone()),
            SystemPlayer::new(),
            permissions,
            self.data_dir.clone(),
        )
    }
}

/// Rejects story ids outside the collection.
pub fn check_story_id(story_id: u32) -> anyhow::Result<()> {
    if (1..=STORY_COUNT).contains(&story_id) {
        Ok(())
    } else {
        Err(anyhow!("Story {story_id} is out of range (1-{STORY_COUNT})"))
    }
}

/// Title and section text for display, when the catalog knows them.
pub fn section_display(
    catalog: Option<&Catalog>,
    story_id: u32,
    section_index: u32,
) -> anyhow::Result<(String, String)> {
    let fallback_title = format!("Story {story_id:02} section {section_index}");
    let Some(story) = catalog.and_then(|c| c.story(story_id)) else {
        return Ok((fallback_title, String::new()));
    };
    let section: &Section = story
        .sections
        .iter()
        .find(|s| s.index == section_index)
        .ok_or_else(|| {
            anyhow!(
                "Story {story_id} has no section {section_index} (1-{})",
                story.sections.len()
            )
        })?;
    Ok((
        format!("{} ({story_id}:{section_index})", story.title),
        section.text.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::parse_story_markdown;

    #[test]
    fn story_ids_are_bounded() {
        assert!(check_story_id(1).is_ok());
        assert!(check_story_id(50).is_ok());
        assert!(check_story_id(0).is_err());
        assert!(check_story_id(51).is_err());
    }

    #[test]
    fn section_display_uses_catalog_when_present() {
        let story = parse_story_markdown("# 3. The Flood\n\n![a](a.jpg)\nNoah built a boat.\n", 3);
        let catalog = Catalog {
            stories: vec![story],
        };

        let (title, text) = section_display(Some(&catalog), 3, 1).unwrap();
        assert_eq!(title, "3. The Flood (3:1)");
        assert_eq!(text, "Noah built a boat.");

        assert!(section_display(Some(&catalog), 3, 9).is_err());

        let (title, text) = section_display(None, 3, 1).unwrap();
        assert_eq!(title, "Story 03 section 1");
        assert!(text.is_empty());
    }
}
