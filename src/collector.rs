//! Collecting locally picked files for batch conversion.
//!
//! [`FileCollector`] accumulates user-selected files that pass the audio
//! mimetype filter. The pending sequence is append-only for the lifetime of
//! the collector: entries are never removed, reordered, or deduplicated.

use std::path::{Path, PathBuf};

use crate::audio::LoadedAudio;
use crate::error::Mp3ifyError;
use crate::naming::{format_bytes, mime_for_extension};

/// One picked file awaiting conversion.
///
/// Never mutated after construction — only read during conversion attempts.
#[derive(Debug, Clone)]
pub struct PendingFile {
    /// Display name (the path's final component).
    pub name: String,
    /// Size in bytes at pick time.
    pub size: u64,
    /// Content type classified from the file extension.
    pub mime: String,
    /// Where the bytes live.
    pub path: PathBuf,
}

impl PendingFile {
    /// Describe the file at `path`.
    ///
    /// The mimetype is classified from the extension; unknown extensions
    /// get `application/octet-stream`, which the collector then filters
    /// out.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Mp3ifyError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let mime = path
            .extension()
            .and_then(|extension| mime_for_extension(&extension.to_string_lossy()))
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(Self {
            name,
            size: metadata.len(),
            mime,
            path: path.to_path_buf(),
        })
    }

    /// Read the file's bytes into a [`LoadedAudio`] for conversion.
    ///
    /// # Errors
    ///
    /// [`Mp3ifyError::EmptyBody`] when the file is empty, or
    /// [`Mp3ifyError::Io`] when it cannot be read.
    pub async fn load(&self) -> Result<LoadedAudio, Mp3ifyError> {
        let bytes = tokio::fs::read(&self.path).await?;
        if bytes.is_empty() {
            return Err(Mp3ifyError::EmptyBody);
        }

        Ok(LoadedAudio {
            bytes,
            display_name: self.name.clone(),
            mime: self.mime.clone(),
        })
    }
}

/// Append-only set of files pending conversion.
#[derive(Debug, Default)]
pub struct FileCollector {
    pending: Vec<PendingFile>,
}

impl FileCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add candidates that pass the audio filter.
    ///
    /// Only files whose mimetype starts with `audio/` survive; everything
    /// else is dropped with a log line. Survivors are appended in order.
    /// Returns how many candidates were accepted.
    pub fn add_files(&mut self, candidates: impl IntoIterator<Item = PendingFile>) -> usize {
        let before = self.pending.len();
        for candidate in candidates {
            if candidate.mime.starts_with("audio/") {
                self.pending.push(candidate);
            } else {
                log::info!("skipping {} ({}): not an audio file", candidate.name, candidate.mime);
            }
        }
        self.pending.len() - before
    }

    /// The pending sequence, in pick order.
    pub fn pending(&self) -> &[PendingFile] {
        &self.pending
    }

    /// `true` when there is at least one pending file — the condition for
    /// enabling the conversion trigger.
    pub fn can_convert(&self) -> bool {
        !self.pending.is_empty()
    }

    /// One display row per pending file: `"name (1.5 KB)"`.
    pub fn listing(&self) -> Vec<String> {
        self.pending
            .iter()
            .map(|file| format!("{} ({})", file.name, format_bytes(file.size)))
            .collect()
    }
}
