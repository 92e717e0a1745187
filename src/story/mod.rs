//! Open Bible Stories content: parsing, image URLs, download and catalog.

pub mod catalog;
pub mod fetch;
pub mod images;
pub mod markdown;

pub use catalog::Catalog;
pub use fetch::{fetch_stories, ContentCache};
pub use images::{obs_cdn_image, ImageSize};
pub use markdown::{markdown_to_text, parse_story_markdown, Section, Story};

/// Number of stories in the OBS collection.
pub const STORY_COUNT: u32 = 50;
