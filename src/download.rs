//! Materializing conversion results as downloadable artifacts.
//!
//! [`Materializer`] writes result bytes into a target directory and hands
//! back a [`DownloadHandle`] — a revocable, transient reference to the
//! artifact. Presenting a new result opportunistically revokes the
//! previously presented one so artifacts do not accumulate unboundedly;
//! an unrevoked handle simply lives until session teardown.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::audio::{ConversionResult, MP3_MIME};
use crate::error::Mp3ifyError;

/// A revocable reference to a materialized artifact.
#[derive(Debug)]
pub struct DownloadHandle {
    /// Where the bytes were written.
    pub path: PathBuf,
    /// The user-facing label (the suggested filename).
    pub filename: String,
    revoked: bool,
}

impl DownloadHandle {
    /// MIME type of the artifact. Always `audio/mpeg`.
    pub fn mime(&self) -> &'static str {
        MP3_MIME
    }

    /// `true` until [`revoke`](DownloadHandle::revoke) has run.
    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Remove the artifact eagerly. Best-effort and idempotent.
    pub fn revoke(&mut self) {
        if self.revoked {
            return;
        }
        if let Err(error) = std::fs::remove_file(&self.path) {
            log::debug!("revoke: could not remove {}: {error}", self.path.display());
        }
        self.revoked = true;
    }
}

/// Writes conversion results into a target directory.
pub struct Materializer {
    directory: PathBuf,
    /// Path of the most recently presented artifact, revoked when the
    /// next presentation supersedes it.
    previous: Mutex<Option<PathBuf>>,
    retain: bool,
}

impl Materializer {
    /// Present artifacts inside `directory` (created if missing).
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            previous: Mutex::new(None),
            retain: false,
        }
    }

    /// Keep every presented artifact instead of revoking the superseded
    /// one. Batch conversion uses this: each file in the sequence is its
    /// own download.
    #[must_use]
    pub fn retain_all(mut self) -> Self {
        self.retain = true;
        self
    }

    /// Write `result` to disk under its suggested filename and return a
    /// handle to it.
    ///
    /// The bytes land in a uniquely named temporary file first and are
    /// persisted atomically, so a half-written artifact is never visible
    /// under the final name. The previously presented artifact, if any,
    /// is revoked best-effort.
    pub fn present(&self, result: &ConversionResult) -> Result<DownloadHandle, Mp3ifyError> {
        std::fs::create_dir_all(&self.directory)?;

        let target = self.directory.join(safe_filename(&result.suggested_filename));

        let mut staged = tempfile::NamedTempFile::new_in(&self.directory)?;
        staged.write_all(&result.bytes)?;
        staged
            .persist(&target)
            .map_err(|error| Mp3ifyError::Io(error.error))?;

        log::info!("materialized {} ({} bytes)", target.display(), result.bytes.len());

        let superseded = self.previous.lock().unwrap().replace(target.clone());
        if let Some(old) = superseded {
            if !self.retain && old != target {
                if let Err(error) = std::fs::remove_file(&old) {
                    log::debug!("could not revoke {}: {error}", old.display());
                }
            }
        }

        Ok(DownloadHandle {
            path: target,
            filename: result.suggested_filename.clone(),
            revoked: false,
        })
    }
}

/// Reduce a suggested filename to its final path component so a crafted
/// display name cannot escape the target directory.
fn safe_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|component| component.to_string_lossy().into_owned())
        .unwrap_or_default();
    if base.is_empty() || base == "." || base == ".." {
        "output.mp3".to_string()
    } else {
        base
    }
}
