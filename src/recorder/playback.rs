//! Narration playback through a system audio player.

use anyhow::{anyhow, Result};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Playback side of the recorder.
pub trait PlaybackBackend {
    /// Starts playing `path`, replacing anything already playing.
    fn play(&mut self, path: &Path) -> Result<()>;

    /// Stops playback. Does nothing when idle.
    fn stop(&mut self) -> Result<()>;

    /// Whether audio is still playing.
    fn is_playing(&mut self) -> bool;
}

/// Players tried in order, with the arguments that make them exit at the end
/// of the file without opening a window.
fn players() -> &'static [(&'static str, &'static [&'static str])] {
    if cfg!(target_os = "macos") {
        &[
            ("afplay", &[]),
            ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
        ]
    } else {
        &[
            ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
            ("mpv", &["--no-video", "--really-quiet"]),
            ("paplay", &[]),
        ]
    }
}

/// Plays audio by spawning a player process.
#[derive(Default)]
pub struct SystemPlayer {
    child: Option<Child>,
}

impl SystemPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaybackBackend for SystemPlayer {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.stop()?;
        for (player, args) in players() {
            match Command::new(player)
                .args(*args)
                .arg(path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                Ok(child) => {
                    tracing::info!("Playing {} with {}", path.display(), player);
                    self.child = Some(child);
                    return Ok(());
                }
                Err(e) => tracing::debug!("Player {} unavailable: {}", player, e),
            }
        }
        Err(anyhow!(
            "No audio player found. Install ffplay (ffmpeg), mpv, or paplay"
        ))
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                child
                    .kill()
                    .map_err(|e| anyhow!("Failed to stop audio player: {e}"))?;
                tracing::debug!("Playback stopped");
            }
            let _ = child.wait();
        }
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        match self.child.as_mut().map(|c| c.try_wait()) {
            Some(Ok(None)) => true,
            Some(_) => {
                self.child = None;
                false
            }
            None => false,
        }
    }
}

impl Drop for SystemPlayer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_player_stops_cleanly() {
        let mut player = SystemPlayer::new();
        assert!(!player.is_playing());
        assert!(player.stop().is_ok());
    }

    #[test]
    fn every_platform_has_a_player() {
        assert!(!players().is_empty());
    }
}
