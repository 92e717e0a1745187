//! Persistence of recorded section narration.

pub mod storage;

pub use storage::{RecordingEntry, RecordingStore};
