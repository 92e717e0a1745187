//! Configuration file management for obs2vid.
//!
//! This module handles loading and saving application configuration from TOML files.
//! Configuration is stored in the user's config directory.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Encoded narration container/codec.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// AAC in an `.m4a` container
    #[default]
    Aac,
}

impl AudioFormat {
    /// ffmpeg encoder name
    pub fn codec(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Aac => "m4a",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.codec())
    }
}

/// Narration recording settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `obs2vid list-devices`
    /// - device name from `obs2vid list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Encoded sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// 1 (mono) or 2 (stereo)
    #[serde(default = "default_channels")]
    pub channels: u16,
    /// Encoder bit rate in bits per second
    #[serde(default = "default_bit_rate")]
    pub bit_rate: u32,
    #[serde(default)]
    pub format: AudioFormat,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channels() -> u16 {
    1
}

fn default_bit_rate() -> u32 {
    64000
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            bit_rate: default_bit_rate(),
            format: AudioFormat::default(),
        }
    }
}

/// Video export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Overlap between neighbouring sections in milliseconds
    #[serde(default = "default_crossfade_ms")]
    pub crossfade_ms: f64,
    /// Write an `.srt` caption file next to the export
    #[serde(default = "default_true")]
    pub make_srt: bool,
    /// Seed for Ken Burns pan/zoom paths
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Directory for export outputs; defaults to `<data dir>/exports`
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_fps() -> u32 {
    crate::export::timeline::DEFAULT_FPS
}

fn default_crossfade_ms() -> f64 {
    crate::export::duration::DEFAULT_CROSSFADE_MS
}

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            crossfade_ms: default_crossfade_ms(),
            make_srt: true,
            seed: default_seed(),
            output_dir: None,
        }
    }
}

/// Story content settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContentConfig {
    /// Content cache directory; defaults to `<data dir>/cache/en`
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Obs2vidConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

impl Obs2vidConfig {
    /// Loads configuration from the user's config directory, writing defaults
    /// on first run.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read or written
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            tracing::info!("No config at {}, writing defaults", config_path.display());
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Obs2vidConfig = toml::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config {}: {e}", config_path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let config_content = toml::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !matches!(self.audio.channels, 1 | 2) {
            return Err(anyhow!(
                "audio.channels must be 1 or 2, got {}",
                self.audio.channels
            ));
        }
        if self.export.crossfade_ms < 0.0 {
            return Err(anyhow!("export.crossfade_ms must be >= 0"));
        }
        if self.export.fps == 0 {
            return Err(anyhow!("export.fps must be greater than 0"));
        }
        Ok(())
    }

    /// Content cache directory, falling back to `<data_dir>/cache/en`.
    pub fn cache_dir(&self, data_dir: &Path) -> PathBuf {
        self.content
            .cache_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("cache").join("en"))
    }

    /// Export output directory, falling back to `<data_dir>/exports`.
    pub fn export_dir(&self, data_dir: &Path) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("exports"))
    }
}

/// Retrieves the path to the config file.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("obs2vid");
    Ok(config_dir.join("obs2vid.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("obs2vid.toml");
        let config = Obs2vidConfig::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, Obs2vidConfig::default());
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.export.crossfade_ms, 350.0);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs2vid.toml");
        fs::write(&path, "[export]\ncrossfade_ms = 500.0\nwidth = 1280\nheight = 720\n").unwrap();

        let config = Obs2vidConfig::load_from(&path).unwrap();
        assert_eq!(config.export.crossfade_ms, 500.0);
        assert_eq!(config.export.width, 1280);
        assert_eq!(config.export.fps, 30);
        assert_eq!(config.audio.bit_rate, 64000);
        assert_eq!(config.audio.format, AudioFormat::Aac);
    }

    #[test]
    fn rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs2vid.toml");
        fs::write(&path, "[audio]\nchannels = 6\n").unwrap();
        assert!(Obs2vidConfig::load_from(&path).is_err());

        fs::write(&path, "[export]\ncrossfade_ms = -10.0\n").unwrap();
        assert!(Obs2vidConfig::load_from(&path).is_err());
    }

    #[test]
    fn directories_fall_back_to_data_dir() {
        let config = Obs2vidConfig::default();
        let data = Path::new("/data");
        assert_eq!(config.cache_dir(data), PathBuf::from("/data/cache/en"));
        assert_eq!(config.export_dir(data), PathBuf::from("/data/exports"));
    }
}
