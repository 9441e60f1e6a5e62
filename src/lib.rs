//! # mp3ify
//!
//! Obtain an MP3 file starting from either a remote URL or locally picked
//! files, with the transcode performed by an external FFmpeg encoder.
//!
//! `mp3ify` owns the plumbing around the encoder, not the codec: it
//! validates and fetches input bytes, stages them into the encoder's
//! working filesystem, drives the transcode with a bitrate parameter,
//! reports progress, and materializes the result as a downloadable file.
//! The encoder itself is an opaque collaborator behind the [`Encoder`]
//! trait.
//!
//! ## Quick Start
//!
//! ### Convert a remote file
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mp3ify::{AudioFetcher, Bitrate, Converter, FfmpegEncoder, Materializer, Mp3ifyError};
//!
//! # async fn example() -> Result<(), Mp3ifyError> {
//! let fetcher = AudioFetcher::new();
//! let converter = Converter::new(Arc::new(FfmpegEncoder::new()));
//! let materializer = Materializer::new("downloads");
//!
//! let audio = fetcher.fetch("https://example.com/music/song.mp3").await?;
//! let result = converter.convert(&audio, Bitrate::Kbps192).await?;
//! let handle = materializer.present(&result)?;
//! println!("saved {}", handle.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ### Convert picked files in order
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mp3ify::{Bitrate, Converter, FfmpegEncoder, FileCollector, Mp3ifyError, PendingFile};
//!
//! # async fn example() -> Result<(), Mp3ifyError> {
//! let mut collector = FileCollector::new();
//! collector.add_files([PendingFile::from_path("a.wav")?, PendingFile::from_path("b.ogg")?]);
//!
//! let converter = Converter::new(Arc::new(FfmpegEncoder::new()));
//! for outcome in converter.convert_all(collector.pending(), Bitrate::Kbps320).await {
//!     let result = outcome?;
//!     println!("{} -> {} bytes", result.suggested_filename, result.bytes.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Design notes
//!
//! - **Single-flight** — one encoder instance holds one mutable working
//!   filesystem; overlapping conversions are rejected with
//!   [`Mp3ifyError::Busy`] rather than interleaved.
//! - **Attempt tokens** — progress and status writes carry a token from
//!   [`ProgressReporter::begin`], so a superseded operation can never
//!   clobber the state of a newer one.
//! - **Guaranteed cleanup** — staged names are unlinked on every exit
//!   path out of a conversion, success or failure.
//!
//! ## Requirements
//!
//! The production encoder shells out to `ffmpeg` (and `ffprobe` for
//! progress ratios); both must be on `PATH` or configured explicitly via
//! [`FfmpegEncoder::with_binary`].

pub mod audio;
pub mod collector;
pub mod convert;
pub mod download;
pub mod encoder;
pub mod error;
pub mod fetch;
pub mod naming;
pub mod progress;

pub use audio::{Bitrate, ConversionResult, LoadedAudio, MP3_MIME};
pub use collector::{FileCollector, PendingFile};
pub use convert::Converter;
pub use download::{DownloadHandle, Materializer};
pub use encoder::{Encoder, FfmpegEncoder, TranscodeOptions};
pub use error::Mp3ifyError;
pub use fetch::AudioFetcher;
pub use progress::{AttemptToken, ProgressObserver, ProgressReporter, ProgressUpdate};
