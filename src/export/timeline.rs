//! Segment placement on a crossfaded timeline.
//!
//! Each section starts one crossfade before the previous one ends, so the
//! plan's total always agrees with [`super::duration::compute_duration`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_FPS: u32 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("No sections")]
    NoSections,
    #[error("crossfadeMs must be >= 0")]
    NegativeCrossfade,
}

/// A section ready to be placed on the export timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionExportSpec {
    pub index: u32,
    pub image_path: PathBuf,
    pub audio_path: PathBuf,
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSegment {
    pub index: u32,
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl TimelineSegment {
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePlan {
    pub segments: Vec<TimelineSegment>,
    pub total_duration_ms: f64,
    pub fps: u32,
    pub total_frames: u64,
    pub crossfade_ms: f64,
}

/// Lays sections out back to back, overlapping neighbours by `crossfade_ms`.
///
/// # Errors
/// - `NoSections` if `sections` is empty
/// - `NegativeCrossfade` if `crossfade_ms` is below zero
pub fn build_timeline(
    sections: &[SectionExportSpec],
    fps: u32,
    crossfade_ms: f64,
) -> Result<TimelinePlan, TimelineError> {
    if sections.is_empty() {
        return Err(TimelineError::NoSections);
    }
    if crossfade_ms < 0.0 {
        return Err(TimelineError::NegativeCrossfade);
    }

    let mut segments = Vec::with_capacity(sections.len());
    let mut cursor = 0.0;
    for (i, section) in sections.iter().enumerate() {
        segments.push(TimelineSegment {
            index: section.index,
            start_ms: cursor,
            duration_ms: section.duration_ms,
        });
        if i + 1 < sections.len() {
            cursor += section.duration_ms - crossfade_ms;
        }
    }

    let total_duration_ms = segments.last().map(TimelineSegment::end_ms).unwrap_or(0.0);
    let total_frames = (total_duration_ms / 1000.0 * fps as f64).round().max(0.0) as u64;

    Ok(TimelinePlan {
        segments,
        total_duration_ms,
        fps,
        total_frames,
        crossfade_ms,
    })
}
