//! Open Bible Stories markdown parsing.
//!
//! A story file is a `# Title` heading followed by image lines, each image
//! opening a new section whose prose runs until the next image.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One narrated frame of a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub story_id: u32,
    /// 1-based position within the story, e.g. 3 in 32:3.
    pub index: u32,
    /// Plain text, no markdown.
    pub text: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: u32,
    pub title: String,
    pub sections: Vec<Section>,
}

struct Patterns {
    heading: Regex,
    fence: Regex,
    code: Regex,
    bold: Regex,
    star: Regex,
    underscore: Regex,
    link: Regex,
    image: Regex,
    trailing: Regex,
    image_line: Regex,
    title: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static markdown pattern");
        Patterns {
            heading: re(r"(?m)^#\s+.*$"),
            fence: re(r"(?s)```.*?```"),
            code: re(r"`([^`]+)`"),
            bold: re(r"\*\*([^*]+)\*\*"),
            star: re(r"\*([^*]+)\*"),
            underscore: re(r"_([^_]+)_"),
            link: re(r"\[([^\]]+)\]\(([^)]+)\)"),
            image: re(r"!\[[^\]]*\]\(([^)]+)\)"),
            trailing: re(r"(?m)[ \t]+$"),
            image_line: re(r"^!\[[^\]]*\]\(([^)]+)\)"),
            title: re(r"(?m)^#\s+(.+)$"),
        }
    })
}

/// Strips the small markdown subset used in story prose, leaving readable text.
pub fn markdown_to_text(markdown: &str) -> String {
    let p = patterns();
    let text = markdown.replace('\r', "");
    let text = p.heading.replace_all(&text, "");
    let text = p.fence.replace_all(&text, "");
    let text = p.code.replace_all(&text, "$1");
    let text = p.bold.replace_all(&text, "$1");
    let text = p.star.replace_all(&text, "$1");
    let text = p.underscore.replace_all(&text, "$1");
    // Images go before links, otherwise `![a](b)` would leave a stray `!a`.
    let text = p.image.replace_all(&text, "");
    let text = p.link.replace_all(&text, "$1");
    let text = p.trailing.replace_all(&text, "");
    text.trim().to_string()
}

/// Parses a story file into sections, one per image line.
///
/// Lines before the first image (the title, front matter) belong to no section.
pub fn parse_story_markdown(markdown: &str, story_id: u32) -> Story {
    let p = patterns();

    let mut raw: Vec<(String, String)> = Vec::new();
    for line in markdown.lines() {
        if let Some(caps) = p.image_line.captures(line.trim()) {
            raw.push((caps[1].to_string(), String::new()));
        } else if let Some((_, text)) = raw.last_mut() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(line);
        }
    }

    let sections = raw
        .into_iter()
        .enumerate()
        .map(|(i, (image_url, text))| Section {
            story_id,
            index: i as u32 + 1,
            text: markdown_to_text(&text),
            image_url,
            audio_path: None,
            duration_ms: None,
        })
        .collect();

    let title = p
        .title
        .captures(markdown)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| format!("Story {story_id:02}"));

    Story {
        id: story_id,
        title,
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# 32. Jesus Heals a Paralytic

![Frame 1](https://cdn.door43.org/obs/jpg/360px/obs-en-32-01.jpg)
Jesus healed a paralyzed man who was brought to him.

The crowds praised God.

![Frame 2](https://cdn.door43.org/obs/jpg/360px/obs-en-32-02.jpg)
The religious leaders were angry with Jesus.
";

    #[test]
    fn strips_inline_markdown() {
        assert_eq!(
            markdown_to_text("**Bold** and _italic_ and `code`"),
            "Bold and italic and code"
        );
        assert_eq!(markdown_to_text("see [the link](http://x) now"), "see the link now");
        assert_eq!(markdown_to_text("a ![pic](http://x/y.jpg) b"), "a  b");
        assert_eq!(markdown_to_text("# Title\n```\ncode\n```\nbody  \r\n"), "body");
    }

    #[test]
    fn parses_sections_with_indices_and_text() {
        let story = parse_story_markdown(SAMPLE, 32);
        assert_eq!(story.id, 32);
        assert!(story.title.starts_with("32."));
        assert_eq!(story.sections.len(), 2);

        let first = &story.sections[0];
        assert_eq!(first.index, 1);
        assert_eq!(first.story_id, 32);
        assert!(first.image_url.contains("obs-en-32-01"));
        assert_eq!(
            first.text,
            "Jesus healed a paralyzed man who was brought to him.\n\nThe crowds praised God."
        );

        let second = &story.sections[1];
        assert_eq!(second.index, 2);
        assert!(second.image_url.contains("obs-en-32-02"));
        assert!(second.text.contains("religious leaders"));
    }

    #[test]
    fn title_falls_back_to_story_number() {
        let story = parse_story_markdown("![a](b.jpg)\ntext", 7);
        assert_eq!(story.title, "Story 07");
        assert_eq!(story.sections[0].text, "text");
    }
}
