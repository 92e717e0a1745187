//! Microphone capture.
//!
//! [`CpalCapture`] records from a configured or default input device, mixes
//! to mono PCM, and on finish writes a temporary WAV that ffmpeg encodes into
//! the requested format. A short window of recent samples drives the level meter.

use super::{ffmpeg, StartOptions};
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Quietest level reported by the meter, in dBFS.
pub const METER_FLOOR_DB: f32 = -160.0;

/// Samples used for one meter reading (about 50 ms at 48 kHz).
const METER_WINDOW: usize = 2400;

/// Capture side of the recorder.
pub trait CaptureBackend {
    /// Whether an input device is present.
    fn is_available(&self) -> bool;

    /// Starts capturing.
    fn start(&mut self, options: &StartOptions) -> Result<()>;

    /// Stops capturing and writes encoded audio to `output`.
    /// Returns the captured duration in milliseconds.
    fn finish(&mut self, output: &Path, options: &StartOptions) -> Result<f64>;

    /// Stops capturing and drops the captured audio without writing anything.
    fn discard(&mut self);

    /// Level of the most recent audio in dBFS.
    fn level_db(&self) -> f32;
}

/// Root-mean-square level of 16-bit samples in dBFS, floored at [`METER_FLOOR_DB`].
pub fn rms_dbfs(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return METER_FLOOR_DB;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum_squares / samples.len() as f64).sqrt();
    if rms <= 0.0 {
        return METER_FLOOR_DB;
    }
    ((20.0 * (rms / i16::MAX as f64).log10()) as f32).clamp(METER_FLOOR_DB, 0.0)
}

/// Mixes interleaved frames down to mono by averaging channels.
pub fn mix_to_mono(data: &[i16], channels: usize, out: &mut Vec<i16>) {
    match channels {
        0 | 1 => out.extend_from_slice(data),
        _ => {
            for frame in data.chunks_exact(channels) {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                out.push((sum / channels as i32) as i16);
            }
        }
    }
}

/// Records from a cpal input device.
pub struct CpalCapture {
    device_name: String,
    sample_rate: u32,
    samples: Arc<Mutex<Vec<i16>>>,
    stream: Option<cpal::Stream>,
}

impl CpalCapture {
    /// `device_name` is "default", a device name, or an index from `list-devices`.
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            sample_rate: 0,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        }
    }

    fn open_device(&self) -> Result<cpal::Device> {
        suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device(&host, &self.device_name)
            }
        })
    }

    fn take_samples(&self) -> Vec<i16> {
        std::mem::take(&mut *self.samples.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl CaptureBackend for CpalCapture {
    fn is_available(&self) -> bool {
        self.open_device().is_ok()
    }

    fn start(&mut self, options: &StartOptions) -> Result<()> {
        let device = self.open_device()?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device.default_input_config()?;
        let channels = device_config.channels() as usize;
        self.sample_rate = device_config.sample_rate().0;
        if self.sample_rate != options.sample_rate {
            tracing::debug!(
                "Capturing at device rate {}Hz, encoding at {}Hz",
                self.sample_rate,
                options.sample_rate
            );
        }

        self.take_samples();
        let samples = Arc::clone(&self.samples);
        let on_error = |err: cpal::StreamError| tracing::error!("Audio stream error: {}", err);

        let stream = match device_config.sample_format() {
            cpal::SampleFormat::I16 => device.build_input_stream(
                &device_config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let mut samples = samples.lock().unwrap_or_else(|e| e.into_inner());
                    mix_to_mono(data, channels, &mut samples);
                },
                on_error,
                None,
            )?,
            cpal::SampleFormat::F32 => device.build_input_stream(
                &device_config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<i16> = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect();
                    let mut samples = samples.lock().unwrap_or_else(|e| e.into_inner());
                    mix_to_mono(&converted, channels, &mut samples);
                },
                on_error,
                None,
            )?,
            other => return Err(anyhow!("Unsupported input sample format: {other}")),
        };

        stream.play()?;
        self.stream = Some(stream);
        tracing::debug!("Audio stream started ({}Hz, {} channels)", self.sample_rate, channels);
        Ok(())
    }

    fn finish(&mut self, output: &Path, options: &StartOptions) -> Result<f64> {
        self.stream = None;

        let samples = self.take_samples();
        if samples.is_empty() {
            return Err(anyhow!("Recording stopped with no audio captured"));
        }
        let duration_ms = samples.len() as f64 * 1000.0 / self.sample_rate as f64;
        tracing::info!(
            "Recording stopped: {:.2}s ({} samples at {}Hz)",
            duration_ms / 1000.0,
            samples.len(),
            self.sample_rate
        );

        let temp_wav = temp_wav_path();
        write_wav(&samples, self.sample_rate, &temp_wav)?;
        let encoded = ffmpeg::encode(&temp_wav, output, options);
        if let Err(e) = std::fs::remove_file(&temp_wav) {
            tracing::debug!("Failed to remove temp file: {}", e);
        }
        encoded?;

        let file_size = std::fs::metadata(output)?.len();
        tracing::info!("Audio saved: {} ({} bytes)", output.display(), file_size);
        Ok(duration_ms)
    }

    fn discard(&mut self) {
        self.stream = None;
        let dropped = self.take_samples().len();
        tracing::info!("Recording discarded ({} samples dropped)", dropped);
    }

    fn level_db(&self) -> f32 {
        let samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        let start = samples.len().saturating_sub(METER_WINDOW);
        rms_dbfs(&samples[start..])
    }
}

/// Writes mono 16-bit PCM.
pub fn write_wav(samples: &[i16], sample_rate: u32, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    tracing::debug!("Temporary WAV created: {}", path.display());
    Ok(())
}

fn temp_wav_path() -> PathBuf {
    std::env::temp_dir().join(format!("obs2vid_{}.wav", std::process::id()))
}

/// Names of the available input devices, with the default device's name.
pub fn list_input_devices() -> Result<(Vec<cpal::Device>, Option<String>)> {
    suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .filter(|d| d.name().is_ok())
            .collect();
        let default = host.default_input_device().and_then(|d| d.name().ok());
        Ok((devices, default))
    })
}

/// Finds an input device by numeric index or exact name.
fn find_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let mut devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        let count = devices.len();
        if index < count {
            return Ok(devices.swap_remove(index));
        }
        return Err(anyhow!(
            "Device index {} is out of range (0-{})",
            index,
            count.saturating_sub(1)
        ));
    }

    devices
        .into_iter()
        .find(|d| d.name().map(|n| n == device_spec).unwrap_or(false))
        .ok_or_else(|| {
            anyhow!(
                "Audio input device '{device_spec}' not found. Use 'obs2vid list-devices' to see available devices."
            )
        })
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }
    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }
    result
}

#[cfg(not(target_os = "linux"))]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_sits_at_the_floor() {
        assert_eq!(rms_dbfs(&[]), METER_FLOOR_DB);
        assert_eq!(rms_dbfs(&[0; 64]), METER_FLOOR_DB);
    }

    #[test]
    fn full_scale_square_wave_is_zero_dbfs() {
        let samples: Vec<i16> = (0..100)
            .map(|i| if i % 2 == 0 { i16::MAX } else { -i16::MAX })
            .collect();
        assert!(rms_dbfs(&samples).abs() < 0.01);
    }

    #[test]
    fn half_scale_is_about_minus_six() {
        let samples = vec![i16::MAX / 2; 256];
        assert!((rms_dbfs(&samples) + 6.02).abs() < 0.05);
    }

    #[test]
    fn stereo_frames_are_averaged() {
        let mut out = Vec::new();
        mix_to_mono(&[100, 300, -50, 50, 7, 9], 2, &mut out);
        assert_eq!(out, vec![200, 0, 8]);

        let mut mono = Vec::new();
        mix_to_mono(&[1, 2, 3], 1, &mut mono);
        assert_eq!(mono, vec![1, 2, 3]);
    }

    #[test]
    fn wav_intermediate_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        write_wav(&[0, 1000, -1000], 16000, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 3);
    }
}
