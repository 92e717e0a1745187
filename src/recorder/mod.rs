//! Narration recorder.
//!
//! [`Recorder`] owns a capture backend, a playback backend, and the
//! microphone permission broker, and moves between the states in
//! [`state::RecorderState`]. Invalid transitions are rejected with a
//! [`RecorderError`] instead of being silently ignored.

pub mod capture;
pub mod ffmpeg;
pub mod permission;
pub mod playback;
pub mod session;
pub mod state;

pub use capture::{CaptureBackend, CpalCapture};
pub use permission::{ConsolePermissions, PermissionBroker, PermissionError};
pub use playback::{PlaybackBackend, SystemPlayer};
pub use state::{RecorderError, RecorderState};

use crate::config::{AudioConfig, AudioFormat};
use capture::METER_FLOOR_DB;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Meter value reported while nothing is being recorded.
pub const IDLE_METER_DB: f32 = -60.0;

/// Encoder settings for a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct StartOptions {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_rate: u32,
    pub format: AudioFormat,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            bit_rate: 64000,
            format: AudioFormat::Aac,
        }
    }
}

impl From<&AudioConfig> for StartOptions {
    fn from(config: &AudioConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
            bit_rate: config.bit_rate,
            format: config.format,
        }
    }
}

/// A finished recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingOutcome {
    pub path: PathBuf,
    pub duration_ms: f64,
}

pub struct Recorder<C: CaptureBackend, P: PlaybackBackend> {
    capture: C,
    playback: P,
    permissions: PermissionBroker,
    state: RecorderState,
    data_dir: PathBuf,
}

impl<C: CaptureBackend, P: PlaybackBackend> Recorder<C, P> {
    pub fn new(capture: C, playback: P, permissions: PermissionBroker, data_dir: PathBuf) -> Self {
        Self {
            capture,
            playback,
            permissions,
            state: RecorderState::Idle,
            data_dir,
        }
    }

    /// Current state, with playback that ended on its own folded back to idle.
    pub fn state(&mut self) -> &RecorderState {
        if self.state.is_playing() && !self.playback.is_playing() {
            tracing::debug!("Playback finished");
            self.state = RecorderState::Idle;
        }
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    pub fn is_playing(&mut self) -> bool {
        self.state().is_playing()
    }

    pub fn has_permission(&self) -> bool {
        self.permissions.has_permission()
    }

    /// Asks for microphone access.
    ///
    /// # Errors
    /// - `Superseded` if another request is already waiting
    /// - `Abandoned` if the prompt went away without answering
    pub async fn request_permission(&self) -> Result<bool, PermissionError> {
        self.permissions.request().await
    }

    /// Whether an input device is available.
    pub fn can_record(&self) -> bool {
        self.capture.is_available()
    }

    /// Resolves a data-relative path, creating its parent directory.
    pub fn resolve_path(&self, relative: &str) -> Result<PathBuf, RecorderError> {
        crate::paths::resolve_under(&self.data_dir, relative)
            .map_err(|e| RecorderError::Backend(e.into()))
    }

    /// Starts recording into `path`.
    ///
    /// # Errors
    /// - `AlreadyRecording` or `BusyPlaying` from a state that cannot record
    /// - `PermissionDenied` without microphone access
    /// - `Backend` if the device cannot be opened
    pub fn start(&mut self, path: &Path, options: StartOptions) -> Result<(), RecorderError> {
        self.state().can_start()?;
        if !self.permissions.has_permission() {
            return Err(RecorderError::PermissionDenied);
        }

        self.capture.start(&options)?;
        tracing::info!("Recording started: {}", path.display());
        self.state = RecorderState::Recording {
            path: path.to_path_buf(),
            options,
            started_at: Instant::now(),
        };
        Ok(())
    }

    /// Stops recording and encodes the captured audio.
    ///
    /// The recorder is idle afterwards even if encoding fails.
    pub fn stop(&mut self) -> Result<RecordingOutcome, RecorderError> {
        let (path, options, started_at) = match std::mem::take(&mut self.state) {
            RecorderState::Recording {
                path,
                options,
                started_at,
            } => (path, options, started_at),
            other => {
                self.state = other;
                return Err(RecorderError::NotRecording);
            }
        };

        let duration_ms = self.capture.finish(&path, &options)?;
        tracing::info!(
            "Recording finished: {} ({:.0}ms captured, {:.1}s wall clock)",
            path.display(),
            duration_ms,
            started_at.elapsed().as_secs_f64()
        );
        Ok(RecordingOutcome { path, duration_ms })
    }

    /// Ends the recording without encoding, leaving the target path as it was.
    ///
    /// # Errors
    /// - `NotRecording` if no recording is in progress
    pub fn cancel(&mut self) -> Result<(), RecorderError> {
        let path = match std::mem::take(&mut self.state) {
            RecorderState::Recording { path, .. } => path,
            other => {
                self.state = other;
                return Err(RecorderError::NotRecording);
            }
        };
        self.capture.discard();
        tracing::info!("Recording into {} cancelled", path.display());
        Ok(())
    }

    /// Plays `path`, replacing any current playback.
    pub fn play(&mut self, path: &Path) -> Result<(), RecorderError> {
        self.state().can_play()?;
        if self.state.is_playing() {
            self.playback.stop()?;
            self.state = RecorderState::Idle;
        }
        self.playback.play(path)?;
        self.state = RecorderState::Playing {
            path: path.to_path_buf(),
        };
        Ok(())
    }

    /// Stops playback. Does nothing when not playing.
    pub fn stop_play(&mut self) -> Result<(), RecorderError> {
        if !self.state.is_playing() {
            return Ok(());
        }
        self.state = RecorderState::Idle;
        self.playback.stop()?;
        Ok(())
    }

    /// Deletes a recording file. Missing files are not an error.
    pub fn remove(&mut self, path: &Path) -> Result<(), RecorderError> {
        if self.state.playing_path() == Some(path) {
            self.stop_play()?;
        }
        match std::fs::remove_file(path) {
            Ok(()) => {
                tracing::info!("Removed recording {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(RecorderError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Input level in dBFS, or [`IDLE_METER_DB`] when not recording.
    pub fn metering(&self) -> f32 {
        if self.state.is_recording() {
            self.capture.level_db().clamp(METER_FLOOR_DB, 0.0)
        } else {
            IDLE_METER_DB
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::recorder;
    use super::*;

    #[test]
    fn start_options_default_to_narration_settings() {
        let options = StartOptions::default();
        assert_eq!(options.sample_rate, 44100);
        assert_eq!(options.channels, 1);
        assert_eq!(options.bit_rate, 64000);
        assert_eq!(options.format, AudioFormat::Aac);
        assert_eq!(StartOptions::from(&AudioConfig::default()), options);
    }

    #[test]
    fn record_then_stop_returns_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        let path = rec.resolve_path("recordings/take.m4a").unwrap();

        rec.start(&path, StartOptions::default()).unwrap();
        assert!(rec.is_recording());
        assert!(matches!(
            rec.start(&path, StartOptions::default()),
            Err(RecorderError::AlreadyRecording)
        ));

        let outcome = rec.stop().unwrap();
        assert_eq!(outcome.path, path);
        assert_eq!(outcome.duration_ms, 1500.0);
        assert!(path.exists());
        assert_eq!(rec.state().name(), "idle");
    }

    #[test]
    fn start_without_permission_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(false, dir.path());
        let err = rec
            .start(&dir.path().join("take.m4a"), StartOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Microphone permission denied");
        assert!(!rec.is_recording());
    }

    #[test]
    fn stop_when_idle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        assert!(matches!(rec.stop(), Err(RecorderError::NotRecording)));
    }

    #[test]
    fn failed_encode_still_returns_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        rec.capture.fail_finish = true;
        rec.start(&dir.path().join("take.m4a"), StartOptions::default())
            .unwrap();
        assert!(matches!(rec.stop(), Err(RecorderError::Backend(_))));
        assert!(!rec.is_recording());
    }

    #[test]
    fn cancel_leaves_existing_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        let path = dir.path().join("take.m4a");
        std::fs::write(&path, b"earlier take").unwrap();

        rec.start(&path, StartOptions::default()).unwrap();
        rec.cancel().unwrap();
        assert!(!rec.is_recording());
        assert!(!rec.capture.capturing);
        assert_eq!(std::fs::read(&path).unwrap(), b"earlier take");
        assert!(matches!(rec.cancel(), Err(RecorderError::NotRecording)));
    }

    #[test]
    fn recording_and_playback_exclude_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        let path = dir.path().join("take.m4a");

        rec.play(&path).unwrap();
        assert!(matches!(
            rec.start(&path, StartOptions::default()),
            Err(RecorderError::BusyPlaying)
        ));

        rec.stop_play().unwrap();
        rec.start(&path, StartOptions::default()).unwrap();
        assert!(matches!(rec.play(&path), Err(RecorderError::BusyRecording)));
    }

    #[test]
    fn play_replaces_current_playback() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        rec.play(Path::new("a.m4a")).unwrap();
        rec.play(Path::new("b.m4a")).unwrap();
        assert_eq!(rec.playback.plays, 2);
        assert_eq!(rec.state().playing_path(), Some(Path::new("b.m4a")));
    }

    #[test]
    fn stop_play_when_idle_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        assert!(rec.stop_play().is_ok());
        assert_eq!(rec.state().name(), "idle");
    }

    #[test]
    fn finished_playback_folds_back_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        rec.play(Path::new("a.m4a")).unwrap();
        rec.playback.playing = None;
        assert!(!rec.is_playing());
        assert!(rec.start(Path::new("b.m4a"), StartOptions::default()).is_ok());
    }

    #[test]
    fn remove_is_idempotent_and_stops_playback() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        let path = dir.path().join("take.m4a");
        std::fs::write(&path, b"audio").unwrap();

        rec.play(&path).unwrap();
        rec.remove(&path).unwrap();
        assert!(!path.exists());
        assert!(!rec.is_playing());
        assert!(rec.remove(&path).is_ok());
    }

    #[test]
    fn metering_is_clamped_while_recording() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(true, dir.path());
        assert_eq!(rec.metering(), IDLE_METER_DB);

        rec.capture.level = 12.0;
        rec.start(&dir.path().join("take.m4a"), StartOptions::default())
            .unwrap();
        assert_eq!(rec.metering(), 0.0);
        rec.capture.level = -500.0;
        assert_eq!(rec.metering(), METER_FLOOR_DB);
    }

    #[tokio::test]
    async fn permission_request_reports_platform_answer() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(recorder(true, dir.path()).request_permission().await, Ok(true));
        assert_eq!(recorder(false, dir.path()).request_permission().await, Ok(false));
    }
}
