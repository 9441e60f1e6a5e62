//! Filename, mime-type, and size-formatting helpers.
//!
//! Pure functions shared by the fetch guard, the file collector, and the
//! conversion orchestrator: mapping declared content types to filename
//! extensions, deriving display names from URLs, and rendering byte counts
//! in binary-prefixed units.

use percent_encoding::percent_decode_str;
use url::Url;

/// File extensions that mark a URL as pointing directly at an audio file.
const DIRECT_AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "aac", "m4a", "webm"];

/// Map a declared content type to a filename extension.
///
/// Unrecognized types fall back to the generic `bin` marker so the staged
/// input always has *some* extension for the encoder to sniff past.
///
/// # Example
///
/// ```
/// assert_eq!(mp3ify::naming::extension_for_mime("audio/mpeg"), "mp3");
/// assert_eq!(mp3ify::naming::extension_for_mime("text/plain"), "bin");
/// ```
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" | "application/ogg" => "ogg",
        "audio/aac" => "aac",
        "audio/mp4" => "m4a",
        "audio/webm" => "webm",
        "audio/flac" | "audio/x-flac" => "flac",
        _ => "bin",
    }
}

/// Map a filename extension back to a declared content type.
///
/// Used by the file collector to classify picked paths. Returns `None` for
/// extensions that are not known audio containers.
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "ogg" | "oga" => Some("audio/ogg"),
        "aac" => Some("audio/aac"),
        "m4a" => Some("audio/mp4"),
        "webm" => Some("audio/webm"),
        "flac" => Some("audio/flac"),
        _ => None,
    }
}

/// Returns `true` if `mime` declares an audio resource.
///
/// `application/ogg` is the one non-`audio/` type accepted, matching what
/// servers commonly declare for Ogg Vorbis files.
pub fn is_audio_mime(mime: &str) -> bool {
    mime.starts_with("audio/") || mime == "application/ogg"
}

/// Derive a display filename from a URL.
///
/// Takes the last non-empty path segment, percent-decoded. Falls back to
/// `fallback` when the URL cannot be parsed or its path is empty.
///
/// # Example
///
/// ```
/// assert_eq!(
///     mp3ify::naming::filename_from_url("https://example.com/path/song.mp3", "audio"),
///     "song.mp3",
/// );
/// assert_eq!(mp3ify::naming::filename_from_url("not a url", "audio"), "audio");
/// ```
pub fn filename_from_url(url: &str, fallback: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return fallback.to_string();
    };

    let last = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last());

    match last {
        Some(segment) => {
            // A display name does not need to round-trip: segments that do
            // not decode to valid UTF-8 are kept verbatim.
            let decoded = percent_decode_str(segment)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            if decoded.is_empty() {
                fallback.to_string()
            } else {
                decoded
            }
        }
        None => fallback.to_string(),
    }
}

/// Replace the final extension of `name` with `extension`.
///
/// A name without an extension simply gets one appended. Leading dots
/// (hidden files) are not treated as extension separators.
pub fn replace_extension(name: &str, extension: &str) -> String {
    let stem = match name.rfind('.') {
        Some(index) if index > 0 => &name[..index],
        _ => name,
    };
    format!("{stem}.{extension}")
}

/// Heuristic check that a URL names an audio file directly.
///
/// Looks at the path's extension only; the query string is ignored. This is
/// a UX hint — the authoritative check is the response's `Content-Type`.
pub fn is_direct_audio_url(url: &str) -> bool {
    let path = match url.split_once('?') {
        Some((before, _)) => before,
        None => url,
    };

    match path.rsplit_once('.') {
        Some((_, extension)) => DIRECT_AUDIO_EXTENSIONS
            .iter()
            .any(|candidate| extension.eq_ignore_ascii_case(candidate)),
        None => false,
    }
}

/// Format a byte count in binary-prefixed units (B, KB, MB, GB).
///
/// Divides by 1024 per step. Whole bytes are printed without a decimal
/// place; everything above is printed with one.
///
/// # Example
///
/// ```
/// assert_eq!(mp3ify::naming::format_bytes(500), "500 B");
/// assert_eq!(mp3ify::naming::format_bytes(1536), "1.5 KB");
/// assert_eq!(mp3ify::naming::format_bytes(1_048_576), "1.0 MB");
/// ```
pub fn format_bytes(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if size < 1024 {
        return format!("{size} B");
    }

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
