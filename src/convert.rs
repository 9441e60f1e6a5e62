//! The conversion orchestrator.
//!
//! [`Converter`] drives the external encoder through one conversion at a
//! time: ensure the encoder is up, stage the input bytes into its working
//! filesystem, run the transcode, read back the MP3 bytes, and clean up
//! the staged names on every exit path.
//!
//! The encoder holds a single mutable working filesystem, so the converter
//! is single-flight: a second call while one is in progress is rejected
//! with [`Mp3ifyError::Busy`] instead of interleaving writes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mp3ify::{Bitrate, Converter, FfmpegEncoder, LoadedAudio, Mp3ifyError};
//!
//! # async fn example(audio: LoadedAudio) -> Result<(), Mp3ifyError> {
//! let converter = Converter::new(Arc::new(FfmpegEncoder::new()));
//! let result = converter.convert(&audio, Bitrate::Kbps192).await?;
//! println!("{} ({} bytes)", result.suggested_filename, result.bytes.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::audio::{Bitrate, ConversionResult, LoadedAudio};
use crate::collector::PendingFile;
use crate::encoder::{Encoder, TranscodeOptions};
use crate::error::Mp3ifyError;
use crate::naming::{extension_for_mime, replace_extension};
use crate::progress::{AttemptToken, ProgressReporter};

/// Name every transcode writes its result under.
const OUTPUT_NAME: &str = "output.mp3";

/// Single-flight driver of the external encoder.
pub struct Converter {
    encoder: Arc<dyn Encoder>,
    reporter: ProgressReporter,
    busy: AtomicBool,
}

impl Converter {
    /// Create a converter around `encoder` with a detached reporter.
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self {
            encoder,
            reporter: ProgressReporter::new(),
            busy: AtomicBool::new(false),
        }
    }

    /// Report progress and status through `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Convert `input` to MP3 at `bitrate`.
    ///
    /// Steps: lazy encoder initialization, staging under
    /// `input.<ext>`, the transcode run (encoder progress ratios map to
    /// integer percent, clamped to 0–100), output readback, and
    /// unconditional best-effort cleanup of both staged names.
    ///
    /// On any failure the progress resets to 0, the status line carries
    /// the failure message, and no partial result is returned.
    ///
    /// # Errors
    ///
    /// - [`Mp3ifyError::Busy`] when another conversion is in flight.
    /// - [`Mp3ifyError::EncoderInit`] when the encoder cannot come up.
    /// - [`Mp3ifyError::Transcode`] when the run fails or produces nothing.
    pub async fn convert(
        &self,
        input: &LoadedAudio,
        bitrate: Bitrate,
    ) -> Result<ConversionResult, Mp3ifyError> {
        let _flight = Flight::acquire(&self.busy)?;
        let token = self.reporter.begin();

        let input_name = format!("input.{}", extension_for_mime(&input.mime));

        let attempt = self.run_attempt(input, bitrate, &token, &input_name).await;

        // Cleanup runs on every exit path; removal failures are swallowed.
        let staged = StagedNames {
            encoder: self.encoder.as_ref(),
            names: [&input_name, OUTPUT_NAME],
        };
        staged.release().await;

        match attempt {
            Ok(bytes) => {
                self.reporter.complete(&token);
                self.reporter.set_status(&token, "Done");
                Ok(ConversionResult {
                    bytes,
                    suggested_filename: replace_extension(&input.display_name, "mp3"),
                })
            }
            Err(error) => {
                self.reporter.fail(&token, error.to_string());
                Err(error)
            }
        }
    }

    /// Convert the pending sequence strictly in order through the one
    /// shared encoder, one result slot per file.
    ///
    /// A failing file does not stop the batch; its slot carries the error.
    pub async fn convert_all(
        &self,
        files: &[PendingFile],
        bitrate: Bitrate,
    ) -> Vec<Result<ConversionResult, Mp3ifyError>> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let outcome = match file.load().await {
                Ok(audio) => self.convert(&audio, bitrate).await,
                Err(error) => Err(error),
            };
            if let Err(error) = &outcome {
                log::warn!("conversion of {} failed: {error}", file.name);
            }
            results.push(outcome);
        }
        results
    }

    /// The stages that can fail: init, staging, transcode, readback.
    async fn run_attempt(
        &self,
        input: &LoadedAudio,
        bitrate: Bitrate,
        token: &AttemptToken,
        input_name: &str,
    ) -> Result<Vec<u8>, Mp3ifyError> {
        if !self.encoder.is_initialized() {
            self.reporter
                .set_status(token, "Loading the conversion engine…");
            self.encoder.initialize().await?;
        }

        self.reporter.set_status(token, "Preparing…");
        self.encoder.write_file(input_name, &input.bytes).await?;

        self.reporter.set_status(token, "Converting to MP3…");
        let options = TranscodeOptions { bitrate };
        let reporter = self.reporter.clone();
        let progress_token = *token;
        let on_progress = move |ratio: f64| {
            let percent = (ratio * 100.0).round().clamp(0.0, 100.0) as u8;
            reporter.set_percent(&progress_token, percent);
        };

        self.encoder
            .transcode(input_name, OUTPUT_NAME, &options, &on_progress)
            .await?;

        let bytes = self.encoder.read_file(OUTPUT_NAME).await?;
        if bytes.is_empty() {
            return Err(Mp3ifyError::Transcode(
                "encoder produced an empty output".to_string(),
            ));
        }
        Ok(bytes)
    }
}

/// Holds the single-flight slot; releases it when dropped, on every exit
/// path out of [`Converter::convert`].
struct Flight<'a> {
    busy: &'a AtomicBool,
}

impl<'a> Flight<'a> {
    fn acquire(busy: &'a AtomicBool) -> Result<Self, Mp3ifyError> {
        busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Mp3ifyError::Busy)?;
        Ok(Self { busy })
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// The staged names of one attempt. `release` unlinks them best-effort —
/// a missing file is the normal case for stages that never ran.
struct StagedNames<'a> {
    encoder: &'a dyn Encoder,
    names: [&'a str; 2],
}

impl StagedNames<'_> {
    async fn release(self) {
        for name in self.names {
            if let Err(error) = self.encoder.unlink(name).await {
                log::debug!("cleanup: could not unlink {name}: {error}");
            }
        }
    }
}
