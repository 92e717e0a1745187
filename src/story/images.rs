//! Canonical Door43 CDN image URLs for story sections.

use serde::{Deserialize, Serialize};

const CDN_BASE: &str = "https://cdn.door43.org/obs/jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    /// Thumbnails for listings.
    #[serde(rename = "360px")]
    Ui,
    /// Full resolution for video export.
    #[serde(rename = "2160px")]
    Export,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Ui => "360px",
            ImageSize::Export => "2160px",
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `obs-en-SS-II.jpg` for a story/section pair.
pub fn image_basename(story_id: u32, section_index: u32) -> String {
    format!("obs-en-{story_id:02}-{section_index:02}.jpg")
}

pub fn obs_cdn_image(story_id: u32, section_index: u32, size: ImageSize) -> String {
    format!(
        "{CDN_BASE}/{}/{}",
        size.as_str(),
        image_basename(story_id, section_index)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_canonical_cdn_url() {
        assert_eq!(
            obs_cdn_image(32, 3, ImageSize::Ui),
            "https://cdn.door43.org/obs/jpg/360px/obs-en-32-03.jpg"
        );
        assert_eq!(
            obs_cdn_image(1, 1, ImageSize::Export),
            "https://cdn.door43.org/obs/jpg/2160px/obs-en-01-01.jpg"
        );
    }
}
