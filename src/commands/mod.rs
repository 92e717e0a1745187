//! Application command handlers for obs2vid.
//!
//! # Commands
//! - `record`: Narrate a story section with a live input meter
//! - `play`: Listen back to a section's take
//! - `retake`: Discard a section's take
//! - `list`: Narration progress for a story
//! - `export`: Write captions and the render plan for a story
//! - `fetch`: Download story content
//! - `catalog`: Build the story catalog from cached content
//! - `stories`: List catalogued stories
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod catalog;
pub mod config;
pub mod export;
pub mod fetch;
pub mod list;
pub mod list_devices;
pub mod logs;
pub mod play;
pub mod record;
pub mod retake;
pub mod stories;
pub mod workspace;

pub use catalog::handle_catalog;
pub use config::handle_config;
pub use export::{handle_export, ExportOverrides};
pub use fetch::handle_fetch;
pub use list::handle_list;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use play::handle_play;
pub use record::handle_record;
pub use retake::handle_retake;
pub use stories::handle_stories;
