//! Section narration workflow on top of [`Recorder`].
//!
//! Each story section has one recording at a deterministic path, so a retake
//! simply replaces the previous file.

use super::{
    CaptureBackend, PermissionError, PlaybackBackend, Recorder, RecorderError, RecordingOutcome,
    StartOptions,
};
use crate::paths::audio_relative_path;
use std::path::{Path, PathBuf};

/// Makes sure microphone access is granted, prompting if necessary.
pub async fn ensure_record_permission<C, P>(recorder: &Recorder<C, P>) -> Result<bool, PermissionError>
where
    C: CaptureBackend,
    P: PlaybackBackend,
{
    if recorder.has_permission() {
        return Ok(true);
    }
    recorder.request_permission().await
}

/// Resolved audio path for a section.
pub fn section_audio_path<C, P>(
    recorder: &Recorder<C, P>,
    story_id: u32,
    section_index: u32,
) -> Result<PathBuf, RecorderError>
where
    C: CaptureBackend,
    P: PlaybackBackend,
{
    recorder.resolve_path(&audio_relative_path(story_id, section_index))
}

/// Starts recording a section and returns the path being written.
///
/// # Errors
/// - `PermissionDenied` if microphone access is refused or the prompt fails
/// - any state or backend error from [`Recorder::start`]
pub async fn start_section_recording<C, P>(
    recorder: &mut Recorder<C, P>,
    story_id: u32,
    section_index: u32,
    options: StartOptions,
) -> Result<PathBuf, RecorderError>
where
    C: CaptureBackend,
    P: PlaybackBackend,
{
    let granted = match ensure_record_permission(recorder).await {
        Ok(granted) => granted,
        Err(e) => {
            tracing::warn!("Permission request failed: {}", e);
            false
        }
    };
    if !granted {
        return Err(RecorderError::PermissionDenied);
    }

    let path = section_audio_path(recorder, story_id, section_index)?;
    recorder.start(&path, options)?;
    tracing::info!("Recording story {} section {}", story_id, section_index);
    Ok(path)
}

pub fn stop_section_recording<C, P>(
    recorder: &mut Recorder<C, P>,
) -> Result<RecordingOutcome, RecorderError>
where
    C: CaptureBackend,
    P: PlaybackBackend,
{
    recorder.stop()
}

/// Abandons the take in progress. A previously kept take stays in place.
pub fn cancel_section_recording<C, P>(recorder: &mut Recorder<C, P>) -> Result<(), RecorderError>
where
    C: CaptureBackend,
    P: PlaybackBackend,
{
    recorder.cancel()
}

pub fn play_section_recording<C, P>(
    recorder: &mut Recorder<C, P>,
    path: &Path,
) -> Result<(), RecorderError>
where
    C: CaptureBackend,
    P: PlaybackBackend,
{
    recorder.play(path)
}

pub fn stop_playback<C, P>(recorder: &mut Recorder<C, P>) -> Result<(), RecorderError>
where
    C: CaptureBackend,
    P: PlaybackBackend,
{
    recorder.stop_play()
}

/// Discards a section's recording so it can be recorded again.
///
/// Stopping playback and deleting the file are both best effort.
pub fn retake_section_recording<C, P>(recorder: &mut Recorder<C, P>, path: &Path)
where
    C: CaptureBackend,
    P: PlaybackBackend,
{
    if let Err(e) = recorder.stop_play() {
        tracing::debug!("Ignoring playback stop failure during retake: {}", e);
    }
    if let Err(e) = recorder.remove(path) {
        tracing::debug!("Ignoring remove failure during retake: {}", e);
    }
}

/// What a section's controls should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualState {
    Recording,
    Playing,
    ReadyToPlay,
    ReadyToRecord,
}

impl VisualState {
    pub fn derive(is_recording: bool, is_playing: bool, has_audio: bool) -> Self {
        if is_recording {
            Self::Recording
        } else if is_playing {
            Self::Playing
        } else if has_audio {
            Self::ReadyToPlay
        } else {
            Self::ReadyToRecord
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Playing => "playing",
            Self::ReadyToPlay => "ready to play",
            Self::ReadyToRecord => "ready to record",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonStates {
    pub record_disabled: bool,
    pub play_disabled: bool,
    pub retake_disabled: bool,
}

impl ButtonStates {
    pub fn derive(is_recording: bool, is_playing: bool, has_audio: bool) -> Self {
        Self {
            record_disabled: false,
            play_disabled: !has_audio || is_recording,
            retake_disabled: !has_audio || is_recording || is_playing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::recorder;
    use super::*;

    #[test]
    fn visual_state_prefers_activity_over_audio() {
        assert_eq!(VisualState::derive(true, false, true), VisualState::Recording);
        assert_eq!(VisualState::derive(false, true, true), VisualState::Playing);
        assert_eq!(VisualState::derive(false, false, true), VisualState::ReadyToPlay);
        assert_eq!(VisualState::derive(false, false, false), VisualState::ReadyToRecord);
    }

    #[test]
    fn button_states_follow_audio_and_activity() {
        assert_eq!(
            ButtonStates::derive(false, false, false),
            ButtonStates {
                record_disabled: false,
                play_disabled: true,
                retake_disabled: true
            }
        );
        assert_eq!(
            ButtonStates::derive(true, false, true),
            ButtonStates {
                record_disabled: false,
                play_disabled: true,
                retake_disabled: true
            }
        );
        assert_eq!(
            ButtonStates::derive(false, false, true),
            ButtonStates {
                record_disabled: false,
                play_disabled: false,
                retake_disabled: false
            }
        );
        assert!(ButtonStates::derive(false, true, true).retake_disabled);
    }

    #[tokio::test]
    async fn section_recording_lands_at_deterministic_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());

        let path = start_section_recording(&mut rec, 32, 3, StartOptions::default())
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("recordings/obs-en-32-03.m4a"));

        let outcome = stop_section_recording(&mut rec).unwrap();
        assert_eq!(outcome.path, path);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn denied_permission_blocks_section_recording() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(false, dir.path());
        let err = start_section_recording(&mut rec, 1, 1, StartOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Microphone permission denied");
        assert_eq!(ensure_record_permission(&rec).await, Ok(false));
    }

    #[tokio::test]
    async fn cancelled_rerecord_keeps_the_earlier_take() {
        use crate::recordings::{RecordingEntry, RecordingStore};

        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        let mut store = RecordingStore::new(dir.path());

        let path = start_section_recording(&mut rec, 12, 4, StartOptions::default())
            .await
            .unwrap();
        let kept = stop_section_recording(&mut rec).unwrap();
        store
            .set_recording(&RecordingEntry::new(12, 4, kept.path.clone(), kept.duration_ms))
            .unwrap();
        let original = std::fs::read(&path).unwrap();

        let again = start_section_recording(&mut rec, 12, 4, StartOptions::default())
            .await
            .unwrap();
        assert_eq!(again, path);
        cancel_section_recording(&mut rec).unwrap();

        assert!(!rec.is_recording());
        assert_eq!(std::fs::read(&path).unwrap(), original);
        let entry = store.get_recording(12, 4).unwrap().unwrap();
        assert_eq!(entry.audio_path, path);
        assert_eq!(entry.duration_ms, 1500.0);
    }

    #[tokio::test]
    async fn retake_stops_playback_and_removes_audio() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        let path = start_section_recording(&mut rec, 5, 2, StartOptions::default())
            .await
            .unwrap();
        stop_section_recording(&mut rec).unwrap();

        play_section_recording(&mut rec, &path).unwrap();
        retake_section_recording(&mut rec, &path);
        assert!(!path.exists());
        assert!(!rec.is_playing());

        // A second retake has nothing to do and still succeeds quietly.
        retake_section_recording(&mut rec, &path);
        stop_playback(&mut rec).unwrap();
    }
}
