//! Recorder state machine.
//!
//! ```text
//! Idle ──start──▶ Recording ──stop──▶ Idle
//! Idle ──play───▶ Playing ──stop_play / finished──▶ Idle
//! ```
//!
//! Recording and playback never overlap.

use super::StartOptions;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Microphone permission denied")]
    PermissionDenied,
    #[error("Already recording")]
    AlreadyRecording,
    #[error("Not recording")]
    NotRecording,
    #[error("Cannot record while playback is active")]
    BusyPlaying,
    #[error("Cannot play while recording")]
    BusyRecording,
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording {
        path: PathBuf,
        options: StartOptions,
        started_at: Instant,
    },
    Playing {
        path: PathBuf,
    },
}

impl RecorderState {
    pub fn is_recording(&self) -> bool {
        matches!(self, RecorderState::Recording { .. })
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, RecorderState::Playing { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecorderState::Idle => "idle",
            RecorderState::Recording { .. } => "recording",
            RecorderState::Playing { .. } => "playing",
        }
    }

    /// Checks that a recording may start from this state.
    pub fn can_start(&self) -> Result<(), RecorderError> {
        match self {
            RecorderState::Idle => Ok(()),
            RecorderState::Recording { .. } => Err(RecorderError::AlreadyRecording),
            RecorderState::Playing { .. } => Err(RecorderError::BusyPlaying),
        }
    }

    /// Checks that playback may start from this state.
    ///
    /// Playing again while already playing is allowed; the current playback is replaced.
    pub fn can_play(&self) -> Result<(), RecorderError> {
        match self {
            RecorderState::Recording { .. } => Err(RecorderError::BusyRecording),
            RecorderState::Idle | RecorderState::Playing { .. } => Ok(()),
        }
    }

    /// Path being played, if any.
    pub fn playing_path(&self) -> Option<&Path> {
        match self {
            RecorderState::Playing { path } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> RecorderState {
        RecorderState::Recording {
            path: PathBuf::from("take.m4a"),
            options: StartOptions::default(),
            started_at: Instant::now(),
        }
    }

    #[test]
    fn idle_allows_everything() {
        let idle = RecorderState::Idle;
        assert!(idle.can_start().is_ok());
        assert!(idle.can_play().is_ok());
        assert_eq!(idle.name(), "idle");
    }

    #[test]
    fn recording_blocks_start_and_play() {
        let state = recording();
        assert!(matches!(state.can_start(), Err(RecorderError::AlreadyRecording)));
        assert!(matches!(state.can_play(), Err(RecorderError::BusyRecording)));
        assert!(state.is_recording());
    }

    #[test]
    fn playing_blocks_start_but_allows_replay() {
        let state = RecorderState::Playing {
            path: PathBuf::from("take.m4a"),
        };
        assert!(matches!(state.can_start(), Err(RecorderError::BusyPlaying)));
        assert!(state.can_play().is_ok());
        assert_eq!(state.playing_path(), Some(Path::new("take.m4a")));
    }
}
