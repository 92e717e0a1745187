//! Configuration management for obs2vid.
//!
//! This module handles loading and saving application configuration from TOML files.
//! Configuration is stored in the user's config directory and created with
//! defaults the first time any command needs it.

pub mod file;

pub use file::{get_config_path, AudioConfig, AudioFormat, ExportConfig, Obs2vidConfig};
