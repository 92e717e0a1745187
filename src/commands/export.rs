//! Prepare a story export: captions and render plan.

use super::workspace::{check_story_id, Workspace};
use crate::export::{output_file_name, ExportJob, ExportSettings};
use std::path::PathBuf;

/// Overrides for the configured export settings.
#[derive(Debug, Default, Clone)]
pub struct ExportOverrides {
    pub output: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crossfade_ms: Option<f64>,
    pub no_srt: bool,
}

impl ExportOverrides {
    fn apply(&self, mut settings: ExportSettings) -> ExportSettings {
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(crossfade_ms) = self.crossfade_ms {
            settings.crossfade_ms = crossfade_ms;
        }
        if self.no_srt {
            settings.make_srt = false;
        }
        settings
    }
}

pub fn handle_export(story_id: u32, overrides: ExportOverrides) -> Result<(), anyhow::Error> {
    tracing::info!("=== obs2vid Export story {} ===", story_id);
    check_story_id(story_id)?;

    let workspace = Workspace::load()?;
    let recordings = workspace.store().recordings_for_story(story_id)?;
    let catalog = workspace.catalog();
    let story = catalog.as_ref().and_then(|c| c.story(story_id));
    if story.is_none() {
        tracing::warn!("No catalog entry for story {}; captions will be empty", story_id);
    }

    let settings = overrides.apply(ExportSettings::from(&workspace.config.export));
    let output_path = overrides.output.clone().unwrap_or_else(|| {
        workspace
            .config
            .export_dir(&workspace.data_dir)
            .join(output_file_name(chrono::Local::now().timestamp_millis()))
    });

    let job = ExportJob::new(
        story_id,
        &recordings,
        story,
        &workspace.cache,
        settings,
        output_path,
    )?;
    let plan = job.write().map_err(|e| {
        tracing::error!("Export failed: {e}");
        e
    })?;

    println!(
        "Export of story {} planned: {} sections + end card, {:.1}s, {} frames at {} fps",
        story_id,
        plan.sections.len() - 1,
        plan.result.duration_ms / 1000.0,
        plan.timeline.total_frames,
        plan.timeline.fps
    );
    println!("Output:  {}", plan.result.output_path);
    println!("Plan:    {}", job.plan_path().display());
    if let Some(srt_path) = &plan.srt_path {
        println!("Captions: {}", srt_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;

    #[test]
    fn overrides_replace_only_given_settings() {
        let base = ExportSettings::from(&ExportConfig::default());
        let overrides = ExportOverrides {
            width: Some(1280),
            height: Some(720),
            no_srt: true,
            ..Default::default()
        };
        let settings = overrides.apply(base.clone());
        assert_eq!(settings.width, 1280);
        assert_eq!(settings.height, 720);
        assert!(!settings.make_srt);
        assert_eq!(settings.crossfade_ms, base.crossfade_ms);
        assert_eq!(settings.seed, base.seed);
    }
}
