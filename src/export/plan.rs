//! Export job for a narrated story.
//!
//! Gathers a story's recordings, appends the attribution end card, and writes
//! the caption file and a JSON render plan next to the requested output. The
//! plan carries everything a renderer needs: the timeline, per-section audio
//! and images, and Ken Burns crop paths.

use super::duration::{export_duration, ExportError, ExportResult};
use super::ken_burns::{generate_ken_burns_path, Keyframe};
use super::srt::build_srt;
use super::timeline::{build_timeline, SectionExportSpec, TimelinePlan};
use crate::config::ExportConfig;
use crate::recordings::RecordingEntry;
use crate::story::{ContentCache, ImageSize, Story};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

/// Index used for the end card so it never collides with a story section.
pub const END_CARD_INDEX: u32 = 999;
pub const END_CARD_DURATION_MS: f64 = 2000.0;
pub const ATTRIBUTION: &str =
    "Open Bible Stories text © unfoldingWord, images © Sweet Publishing. CC BY-SA 4.0.";

/// `obs2vid-<millis>.mp4`
pub fn output_file_name(timestamp_ms: i64) -> String {
    format!("obs2vid-{timestamp_ms}.mp4")
}

/// Render settings for one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub crossfade_ms: f64,
    pub make_srt: bool,
    pub seed: u64,
}

impl From<&ExportConfig> for ExportSettings {
    fn from(config: &ExportConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            fps: config.fps,
            crossfade_ms: config.crossfade_ms,
            make_srt: config.make_srt,
            seed: config.seed,
        }
    }
}

/// One planned section with its camera motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSection {
    #[serde(flatten)]
    pub spec: SectionExportSpec,
    pub motion: Vec<Keyframe>,
}

/// Complete render plan, written as JSON next to the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPlan {
    pub story_id: u32,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub result: ExportResult,
    pub timeline: TimelinePlan,
    pub sections: Vec<PlannedSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srt_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ExportJob {
    story_id: u32,
    settings: ExportSettings,
    sections: Vec<SectionExportSpec>,
    output_path: PathBuf,
}

impl ExportJob {
    /// Builds a job from the story's recordings, in section order, plus the end card.
    ///
    /// Section text comes from `story` when available and is used for captions.
    ///
    /// # Errors
    /// - If there are no recordings to export
    pub fn new(
        story_id: u32,
        recordings: &[RecordingEntry],
        story: Option<&Story>,
        cache: &ContentCache,
        settings: ExportSettings,
        output_path: PathBuf,
    ) -> Result<Self> {
        if recordings.is_empty() {
            return Err(anyhow!(
                "No recordings for story {story_id}. Record at least one section before exporting."
            ));
        }

        let mut recordings = recordings.to_vec();
        recordings.sort_by_key(|r| r.index);

        let mut sections: Vec<SectionExportSpec> = recordings
            .iter()
            .map(|r| SectionExportSpec {
                index: r.index,
                image_path: cache.image_path(story_id, r.index, ImageSize::Export),
                audio_path: r.audio_path.clone(),
                duration_ms: r.duration_ms,
                text: story
                    .and_then(|s| s.sections.iter().find(|sec| sec.index == r.index))
                    .map(|sec| sec.text.clone()),
            })
            .collect();

        sections.push(SectionExportSpec {
            index: END_CARD_INDEX,
            image_path: PathBuf::new(),
            audio_path: PathBuf::new(),
            duration_ms: END_CARD_DURATION_MS,
            text: Some(ATTRIBUTION.to_string()),
        });

        Ok(Self {
            story_id,
            settings,
            sections,
            output_path,
        })
    }

    pub fn sections(&self) -> &[SectionExportSpec] {
        &self.sections
    }

    /// Caption file written alongside the output.
    pub fn srt_path(&self) -> PathBuf {
        self.output_path.with_extension("srt")
    }

    /// Render plan written alongside the output.
    pub fn plan_path(&self) -> PathBuf {
        self.output_path.with_extension("json")
    }

    /// The job as an export request map.
    pub fn request(&self) -> serde_json::Value {
        json!({
            "outputPath": self.output_path.to_string_lossy(),
            "width": self.settings.width,
            "height": self.settings.height,
            "fps": self.settings.fps,
            "crossfadeMs": self.settings.crossfade_ms,
            "seed": self.settings.seed,
            "makeSrt": self.settings.make_srt,
            "sections": self.sections,
        })
    }

    /// Computes the plan without touching the filesystem.
    ///
    /// # Errors
    /// - `InvalidArguments` if the request is rejected or the crossfade is negative
    /// - `ExportFailure` if the duration cannot be computed
    pub fn plan(&self) -> Result<ExportPlan, ExportError> {
        let result = export_duration(Some(&self.request()))?;
        let timeline = build_timeline(&self.sections, self.settings.fps, self.settings.crossfade_ms)
            .map_err(|e| ExportError::InvalidArguments(e.to_string()))?;

        let sections = self
            .sections
            .iter()
            .map(|spec| PlannedSection {
                motion: if spec.index == END_CARD_INDEX {
                    Vec::new()
                } else {
                    generate_ken_burns_path(
                        self.settings.width,
                        self.settings.height,
                        spec.duration_ms,
                        self.settings.seed,
                        spec.index,
                    )
                },
                spec: spec.clone(),
            })
            .collect();

        Ok(ExportPlan {
            story_id: self.story_id,
            width: self.settings.width,
            height: self.settings.height,
            result,
            timeline,
            sections,
            srt_path: self.settings.make_srt.then(|| self.srt_path()),
        })
    }

    /// Computes the plan and writes captions and the plan file.
    ///
    /// # Errors
    /// - If planning fails
    /// - If the output directory or files cannot be written
    pub fn write(&self) -> Result<ExportPlan> {
        let plan = self.plan()?;
        if let Some(parent) = self.output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if let Some(srt_path) = &plan.srt_path {
            let texts: Vec<Option<&str>> = self.sections.iter().map(|s| s.text.as_deref()).collect();
            fs::write(srt_path, build_srt(&plan.timeline.segments, &texts))?;
            tracing::info!("Captions written to {}", srt_path.display());
        }

        fs::write(self.plan_path(), serde_json::to_string_pretty(&plan)?)?;
        tracing::info!(
            "Export plan for story {} written to {} ({:.1}s, {} frames)",
            self.story_id,
            self.plan_path().display(),
            plan.result.duration_ms / 1000.0,
            plan.timeline.total_frames
        );
        Ok(plan)
    }
}
