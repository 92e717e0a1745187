//! Story catalog built from the local content cache.

use super::fetch::ContentCache;
use super::images::{obs_cdn_image, ImageSize};
use super::markdown::{parse_story_markdown, Story};
use super::STORY_COUNT;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub stories: Vec<Story>,
}

impl Catalog {
    /// Parses every cached story, normalizing image URLs to the UI size.
    ///
    /// Missing story files are skipped with a warning.
    ///
    /// # Errors
    /// - If the content directory does not exist
    /// - If a cached file cannot be read
    pub fn build(cache: &ContentCache) -> Result<Self> {
        let content_dir = cache.content_dir();
        if !content_dir.is_dir() {
            return Err(anyhow!(
                "Missing content cache at {}. Run 'obs2vid fetch' first.",
                content_dir.display()
            ));
        }

        let mut stories = Vec::new();
        for story_id in 1..=STORY_COUNT {
            let path = cache.story_path(story_id);
            if !path.exists() {
                tracing::warn!("Skipping missing story file {}", path.display());
                continue;
            }
            let markdown = fs::read_to_string(&path)?;
            let mut story = parse_story_markdown(&markdown, story_id);
            for section in &mut story.sections {
                section.image_url = obs_cdn_image(story.id, section.index, ImageSize::Ui);
            }
            stories.push(story);
        }

        tracing::info!("Catalog built with {} stories", stories.len());
        Ok(Self { stories })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow!(
                "Failed to read catalog {}: {e}. Run 'obs2vid catalog' first.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn story(&self, story_id: u32) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == story_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_cache_and_round_trips_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        fs::create_dir_all(cache.content_dir()).unwrap();
        fs::write(
            cache.story_path(2),
            "# 2. The Sin Enters the World\n\n![f](local.jpg)\nAdam and Eve.\n",
        )
        .unwrap();

        let catalog = Catalog::build(&cache).unwrap();
        assert_eq!(catalog.stories.len(), 1);
        let story = catalog.story(2).unwrap();
        assert_eq!(story.title, "2. The Sin Enters the World");
        assert_eq!(
            story.sections[0].image_url,
            "https://cdn.door43.org/obs/jpg/360px/obs-en-02-01.jpg"
        );

        let path = dir.path().join("catalog.json");
        catalog.save(&path).unwrap();
        assert_eq!(Catalog::load(&path).unwrap(), catalog);
    }

    #[test]
    fn missing_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path().join("nope"));
        assert!(Catalog::build(&cache).is_err());
    }
}
