//! Core audio value types.
//!
//! [`LoadedAudio`] is the unit of input flowing from the fetch guard or the
//! file collector into the conversion orchestrator; [`ConversionResult`] is
//! the unit of output handed to the download materializer.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// MIME type of every conversion result.
pub const MP3_MIME: &str = "audio/mpeg";

/// Input audio bytes plus the metadata needed to stage and name them.
///
/// Invariants: `bytes` is non-empty and `mime` declares an audio resource
/// (`audio/*` or `application/ogg`). Both producers enforce this before
/// constructing a value.
#[derive(Debug, Clone)]
pub struct LoadedAudio {
    /// The raw input bytes.
    pub bytes: Vec<u8>,
    /// Human-facing name, used to derive the suggested output filename.
    pub display_name: String,
    /// Declared content type of the input.
    pub mime: String,
}

/// Target MP3 bitrate.
///
/// The usual constant-bitrate ladder; 192 kbps is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bitrate {
    /// 128 kbps.
    Kbps128,
    /// 192 kbps.
    #[default]
    Kbps192,
    /// 256 kbps.
    Kbps256,
    /// 320 kbps.
    Kbps320,
}

impl Bitrate {
    /// The numeric bitrate in kilobits per second.
    pub fn kbps(self) -> u32 {
        match self {
            Bitrate::Kbps128 => 128,
            Bitrate::Kbps192 => 192,
            Bitrate::Kbps256 => 256,
            Bitrate::Kbps320 => 320,
        }
    }
}

impl Display for Bitrate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}k", self.kbps())
    }
}

impl FromStr for Bitrate {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().trim_end_matches('k') {
            "128" => Ok(Bitrate::Kbps128),
            "192" => Ok(Bitrate::Kbps192),
            "256" => Ok(Bitrate::Kbps256),
            "320" => Ok(Bitrate::Kbps320),
            other => Err(format!(
                "unsupported bitrate: {other} (expected 128, 192, 256, or 320)"
            )),
        }
    }
}

/// The outcome of a successful transcode.
///
/// Created only on success — a failed attempt never surfaces a partial
/// result. Handed to the [`Materializer`](crate::Materializer), which
/// supersedes (revokes) the previously presented result.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// The encoded MP3 bytes.
    pub bytes: Vec<u8>,
    /// The input's display name with its extension replaced by `.mp3`.
    pub suggested_filename: String,
}

impl ConversionResult {
    /// MIME type of the result. Always `audio/mpeg`.
    pub fn mime(&self) -> &'static str {
        MP3_MIME
    }
}
