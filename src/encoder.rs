//! The external encoder collaborator.
//!
//! The actual transcoding is not implemented here. [`Encoder`] captures the
//! contract the conversion orchestrator relies on: lazy initialization, a
//! flat virtual working filesystem with write/read/unlink semantics, and a
//! transcode operation reporting progress as a ratio in `[0, 1]`.
//!
//! [`FfmpegEncoder`] is the production implementation: it drives the system
//! `ffmpeg` binary over a private temporary directory that plays the role
//! of the working filesystem, and parses `-progress pipe:1` output into
//! ratio callbacks.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::audio::Bitrate;
use crate::error::Mp3ifyError;

/// Receives transcode progress as a ratio in `[0, 1]`.
pub type ProgressFn<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// Settings for one transcode run.
///
/// The output container is always MP3 and any video stream is stripped;
/// only the target bitrate varies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscodeOptions {
    /// Target audio bitrate.
    pub bitrate: Bitrate,
}

/// Contract of the external encoder.
///
/// One encoder instance holds one mutable working filesystem, so callers
/// must serialize access to it (see
/// [`Converter`](crate::Converter)). Staged names live in a flat
/// namespace: path separators are rejected.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Bring the encoder up. Idempotent; suspends until ready.
    async fn initialize(&self) -> Result<(), Mp3ifyError>;

    /// `true` once [`initialize`](Encoder::initialize) has succeeded.
    fn is_initialized(&self) -> bool;

    /// Stage `bytes` under `name` in the working filesystem.
    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), Mp3ifyError>;

    /// Re-encode `input` into `output` as MP3, stripping any video stream.
    ///
    /// `progress` is called with ratios in `[0, 1]` as the run advances;
    /// the final call delivers `1.0`.
    async fn transcode(
        &self,
        input: &str,
        output: &str,
        options: &TranscodeOptions,
        progress: ProgressFn<'_>,
    ) -> Result<(), Mp3ifyError>;

    /// Read back the bytes staged or produced under `name`.
    async fn read_file(&self, name: &str) -> Result<Vec<u8>, Mp3ifyError>;

    /// Remove `name` from the working filesystem.
    async fn unlink(&self, name: &str) -> Result<(), Mp3ifyError>;
}

/// Production [`Encoder`] backed by the system `ffmpeg` binary.
///
/// `initialize` verifies the binary responds to `-version` and creates the
/// temporary working directory; everything staged there is removed when
/// the encoder is dropped.
pub struct FfmpegEncoder {
    binary: PathBuf,
    probe_binary: PathBuf,
    workdir: Mutex<Option<TempDir>>,
}

impl FfmpegEncoder {
    /// Create an encoder that resolves `ffmpeg` and `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            probe_binary: PathBuf::from("ffprobe"),
            workdir: Mutex::new(None),
        }
    }

    /// Use a specific `ffmpeg` binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Use a specific `ffprobe` binary (duration probing for progress).
    #[must_use]
    pub fn with_probe_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.probe_binary = binary.into();
        self
    }

    /// Resolve a staged name to a path inside the working directory.
    fn resolve(&self, name: &str) -> Result<PathBuf, Mp3ifyError> {
        validate_stage_name(name)?;
        let guard = self.workdir.lock().unwrap();
        match guard.as_ref() {
            Some(dir) => Ok(dir.path().join(name)),
            None => Err(Mp3ifyError::EncoderInit(
                "encoder is not initialized".to_string(),
            )),
        }
    }

    /// Ask `ffprobe` for the input duration in seconds.
    ///
    /// Best-effort: `None` when probing fails, in which case progress is
    /// only reported at completion.
    async fn probe_duration(&self, input: &Path) -> Option<f64> {
        let output = Command::new(&self.probe_binary)
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(input)
            .stdin(Stdio::null())
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let duration = text.trim().parse::<f64>().ok()?;
        (duration > 0.0).then_some(duration)
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn initialize(&self) -> Result<(), Mp3ifyError> {
        if self.is_initialized() {
            return Ok(());
        }

        let output = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|error| {
                Mp3ifyError::EncoderInit(format!(
                    "could not run {}: {error}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            return Err(Mp3ifyError::EncoderInit(format!(
                "{} -version exited with {}",
                self.binary.display(),
                output.status,
            )));
        }

        let dir = TempDir::new()
            .map_err(|error| Mp3ifyError::EncoderInit(format!("working dir: {error}")))?;
        log::debug!("encoder working dir: {}", dir.path().display());
        *self.workdir.lock().unwrap() = Some(dir);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.workdir.lock().unwrap().is_some()
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), Mp3ifyError> {
        let path = self.resolve(name)?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn transcode(
        &self,
        input: &str,
        output: &str,
        options: &TranscodeOptions,
        progress: ProgressFn<'_>,
    ) -> Result<(), Mp3ifyError> {
        let input_path = self.resolve(input)?;
        let output_path = self.resolve(output)?;

        let duration = self.probe_duration(&input_path).await;

        log::info!(
            "transcoding {input} -> {output} at {}",
            options.bitrate,
        );

        let mut child = Command::new(&self.binary)
            .args(["-hide_banner", "-nostdin", "-nostats", "-loglevel", "error", "-y"])
            .args(["-progress", "pipe:1"])
            .arg("-i")
            .arg(&input_path)
            .arg("-vn")
            .args(["-b:a", &options.bitrate.to_string()])
            .args(["-f", "mp3"])
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| Mp3ifyError::Transcode(format!("could not spawn ffmpeg: {error}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Mp3ifyError::Transcode("ffmpeg stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Mp3ifyError::Transcode("ffmpeg stderr unavailable".to_string()))?;

        let report = async {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                // -progress emits out_time_us (and historically out_time_ms,
                // also in microseconds) once per interval.
                let elapsed_us = line
                    .strip_prefix("out_time_us=")
                    .or_else(|| line.strip_prefix("out_time_ms="))
                    .and_then(|value| value.trim().parse::<i64>().ok());

                if let (Some(us), Some(total)) = (elapsed_us, duration) {
                    let ratio = (us.max(0) as f64 / 1_000_000.0 / total).clamp(0.0, 1.0);
                    progress(ratio);
                } else if line.trim() == "progress=end" {
                    progress(1.0);
                }
            }
        };

        let drain_stderr = async {
            let mut text = String::new();
            let mut reader = BufReader::new(stderr);
            let _ = reader.read_to_string(&mut text).await;
            text
        };

        let ((), stderr_text) = tokio::join!(report, drain_stderr);

        let status = child.wait().await?;
        if !status.success() {
            let detail = stderr_text.trim();
            let message = if detail.is_empty() {
                format!("ffmpeg exited with {status}")
            } else {
                detail.to_string()
            };
            return Err(Mp3ifyError::Transcode(message));
        }

        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, Mp3ifyError> {
        let path = self.resolve(name)?;
        Ok(tokio::fs::read(path).await?)
    }

    async fn unlink(&self, name: &str) -> Result<(), Mp3ifyError> {
        let path = self.resolve(name)?;
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}

/// Staged names live in a flat namespace: reject anything that could
/// escape the working directory.
fn validate_stage_name(name: &str) -> Result<(), Mp3ifyError> {
    let escapes = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');

    if escapes {
        return Err(Mp3ifyError::InvalidStageName(name.to_string()));
    }
    Ok(())
}
