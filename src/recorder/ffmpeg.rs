//! ffmpeg discovery and narration encoding.
//!
//! Captured audio is written as a 16-bit WAV intermediate and handed to ffmpeg
//! for the final codec. Standard install locations are checked before PATH so
//! ffmpeg is found even from shells with a minimal PATH.

use super::StartOptions;
use anyhow::{anyhow, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Platform install locations checked before PATH.
fn candidates() -> Vec<PathBuf> {
    let paths: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/opt/homebrew/bin/ffmpeg",
            "/usr/local/bin/ffmpeg",
            "/usr/bin/ffmpeg",
        ]
    } else if cfg!(target_os = "linux") {
        &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/snap/bin/ffmpeg"]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\ffmpeg\\bin\\ffmpeg.exe",
            "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
        ]
    } else {
        &[]
    };
    paths.iter().map(PathBuf::from).collect()
}

/// Locates the ffmpeg binary.
///
/// # Errors
/// - If ffmpeg is neither installed in a standard location nor on PATH
pub fn find_ffmpeg() -> Result<PathBuf> {
    if let Some(path) = candidates().into_iter().find(|p| p.exists()) {
        tracing::debug!("Found ffmpeg at: {}", path.display());
        return Ok(path);
    }
    let path = find_in_path("ffmpeg")?;
    tracing::debug!("Found ffmpeg in PATH at: {}", path.display());
    Ok(path)
}

/// Searches PATH with `which` (or `where` on Windows).
pub(crate) fn find_in_path(binary_name: &str) -> Result<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for {binary_name}: {e}"))?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(path_str.lines().next().unwrap_or("").trim());
        if !path.as_os_str().is_empty() {
            return Ok(path);
        }
    }

    Err(anyhow!(
        "{binary_name} not found. Please install ffmpeg:\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
         Windows: Download from https://ffmpeg.org/download.html"
    ))
}

/// ffmpeg arguments that encode `input` into `output` with the narration settings.
pub fn encode_args(input: &Path, output: &Path, options: &StartOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-loglevel", "error", "-y", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(input.into());
    for (flag, value) in [
        ("-acodec", options.format.codec().to_string()),
        ("-ac", options.channels.to_string()),
        ("-ar", options.sample_rate.to_string()),
        ("-b:a", options.bit_rate.to_string()),
    ] {
        args.push(flag.into());
        args.push(value.into());
    }
    args.push(output.into());
    args
}

/// Encodes a WAV file with ffmpeg.
///
/// # Errors
/// - If ffmpeg cannot be found or started
/// - If ffmpeg exits unsuccessfully
pub fn encode(input: &Path, output: &Path, options: &StartOptions) -> Result<()> {
    let ffmpeg = find_ffmpeg()?;
    let result = Command::new(&ffmpeg)
        .args(encode_args(input, output, options))
        .output()
        .map_err(|e| anyhow!("Failed to run ffmpeg: {e}"))?;

    if result.status.success() {
        tracing::debug!("Encoded {} as {}", output.display(), options.format);
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&result.stderr);
        tracing::error!("ffmpeg encoding failed: {}", error_msg);
        Err(anyhow!("Audio encoding failed: {error_msg}"))
    }
}
