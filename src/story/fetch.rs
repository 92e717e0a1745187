//! Downloads Open Bible Stories content from Door43 into the local cache.

use super::images::{image_basename, obs_cdn_image, ImageSize};
use super::markdown::parse_story_markdown;
use super::STORY_COUNT;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

const CONTENT_BASE: &str = "https://git.door43.org/unfoldingWord/en_obs/raw/tag/v9/content";

/// Markdown source URL for a story.
pub fn story_url(story_id: u32) -> String {
    format!("{CONTENT_BASE}/{story_id:02}.md")
}

/// Cache locations for downloaded content.
#[derive(Debug, Clone)]
pub struct ContentCache {
    root: PathBuf,
}

impl ContentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join("content")
    }

    pub fn story_path(&self, story_id: u32) -> PathBuf {
        self.content_dir().join(format!("{story_id:02}.md"))
    }

    pub fn image_path(&self, story_id: u32, section_index: u32, size: ImageSize) -> PathBuf {
        self.root
            .join("images")
            .join(size.as_str())
            .join(image_basename(story_id, section_index))
    }
}

/// Downloads story markdown (and optionally section images) for the given stories.
///
/// Stories already in the cache are skipped unless `force` is set.
///
/// # Errors
/// - If a download fails or returns a non-200 status
/// - If the cache cannot be written
pub async fn fetch_stories(
    cache: &ContentCache,
    stories: &[u32],
    with_images: bool,
    force: bool,
) -> Result<usize> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("obs2vid/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let mut downloaded = 0;
    for &story_id in stories {
        if !(1..=STORY_COUNT).contains(&story_id) {
            return Err(anyhow!("Story {story_id} is out of range (1-{STORY_COUNT})"));
        }

        let dest = cache.story_path(story_id);
        if force || !dest.exists() {
            let url = story_url(story_id);
            tracing::info!("Downloading {}", url);
            download(&client, &url, &dest).await?;
            downloaded += 1;
        } else {
            tracing::debug!("Story {} already cached", story_id);
        }

        if with_images {
            let markdown = tokio::fs::read_to_string(&dest).await?;
            let story = parse_story_markdown(&markdown, story_id);
            for section in &story.sections {
                for size in [ImageSize::Ui, ImageSize::Export] {
                    let image_dest = cache.image_path(story_id, section.index, size);
                    if !force && image_dest.exists() {
                        continue;
                    }
                    let url = obs_cdn_image(story_id, section.index, size);
                    tracing::info!("Caching image {}", url);
                    download(&client, &url, &image_dest).await?;
                }
            }
        }
    }

    Ok(downloaded)
}

async fn download(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("HTTP {} for {url}", status.as_u16()));
    }

    let bytes = response.bytes().await?;
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, &bytes).await?;
    tracing::debug!("Saved {} bytes to {}", bytes.len(), dest.display());
    Ok(())
}
