//! Configuration file editor command.

use crate::config::{get_config_path, Obs2vidConfig};
use std::process::Command;

/// Opens the obs2vid configuration file in the user's preferred editor.
///
/// The file is created with defaults first if it does not exist, and is
/// validated again after editing so mistakes surface immediately.
///
/// # Errors
/// - If no editor can be found or executed
/// - If the edited file no longer parses
pub fn handle_config() -> anyhow::Result<()> {
    let config_path = get_config_path()?;
    Obs2vidConfig::load_from(&config_path)?;

    tracing::info!("Opening config file: {}", config_path.display());

    let editor = find_editor()?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to open editor '{editor}': {e}. Make sure the editor is installed and accessible."
            )
        })?;

    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    Obs2vidConfig::load_from(&config_path)?;
    tracing::info!("Config file edited successfully");
    Ok(())
}

/// Tries $EDITOR, then nano, then vi.
fn find_editor() -> anyhow::Result<String> {
    if let Ok(editor) = std::env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }

    ["nano", "vi"]
        .iter()
        .find(|editor| crate::recorder::ffmpeg::find_in_path(editor).is_ok())
        .map(|editor| editor.to_string())
        .ok_or_else(|| anyhow::anyhow!("No editor found. Please set the $EDITOR environment variable."))
}
