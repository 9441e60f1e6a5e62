//! Error types for the `mp3ify` crate.
//!
//! This module defines [`Mp3ifyError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry enough context to produce a
//! human-readable status line at the boundary of the triggering action —
//! no operation here is expected to crash the process.

use std::io::Error as IoError;

use thiserror::Error;

/// The unified error type for all `mp3ify` operations.
///
/// Every public method that can fail returns `Result<T, Mp3ifyError>`.
/// All variants are terminal for the attempt that produced them; recovery
/// is always user-initiated re-triggering, never an automatic retry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Mp3ifyError {
    /// The URL points at a known hosting platform rather than a direct
    /// audio file. Detected before any network I/O happens.
    #[error("Platform links are not supported ({host}). Use a direct URL to an audio file (mp3/wav/ogg…)")]
    UnsupportedPlatform {
        /// The denylisted host that was matched.
        host: String,
    },

    /// The remote server answered with a non-success status code.
    #[error("HTTP {status} — could not retrieve the file")]
    Http {
        /// The HTTP status code of the response.
        status: u16,
    },

    /// The remote server did not declare an audio content type.
    #[error("The server did not return an audio type (Content-Type: {mime})")]
    UnexpectedContentType {
        /// The declared content type, first `;`-segment, trimmed.
        mime: String,
    },

    /// The response completed but carried no bytes.
    #[error("The server returned an empty body")]
    EmptyBody,

    /// A network-level failure while performing the fetch.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The external encoder could not be initialized.
    #[error("Failed to initialize the encoder: {0}")]
    EncoderInit(String),

    /// The transcode run failed; no partial output is surfaced.
    #[error("Transcode failed: {0}")]
    Transcode(String),

    /// A second conversion was requested while one is already in flight.
    /// The shared encoder holds a single mutable working filesystem, so
    /// overlapping conversions are rejected rather than interleaved.
    #[error("A conversion is already in progress")]
    Busy,

    /// A staged filename escapes the encoder's flat working namespace.
    #[error("Invalid staging name: {0}")]
    InvalidStageName(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}
