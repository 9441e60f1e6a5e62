//! Progress and status reporting.
//!
//! This module provides [`ProgressReporter`], the process-wide progress
//! state shared by the fetch and conversion paths: a single 0–100 percent
//! value and a status line. Updates are guarded by an [`AttemptToken`] so a
//! superseded operation can never clobber the state of a newer one.
//!
//! # Example
//!
//! ```
//! use mp3ify::ProgressReporter;
//!
//! let reporter = ProgressReporter::new();
//! let token = reporter.begin();
//! reporter.set_status(&token, "Downloading the file…");
//! reporter.set_percent(&token, 40);
//!
//! // A newer attempt supersedes the first: its token goes stale.
//! let newer = reporter.begin();
//! reporter.set_percent(&token, 90); // ignored
//! assert_eq!(reporter.percent(), 0);
//! reporter.complete(&newer);
//! assert_eq!(reporter.percent(), 100);
//! ```

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU8, AtomicU64, Ordering},
};

/// A snapshot of the reporter state, delivered to observers on every
/// accepted update.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Completion percentage, clamped to 0–100.
    pub percent: u8,
    /// The current status line.
    pub status: String,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`] because updates may be
/// delivered from the encoder's progress callback on another task.
///
/// Observers are **infallible** — they observe but cannot halt the
/// operation.
pub trait ProgressObserver: Send + Sync {
    /// Called after every accepted state change.
    fn on_update(&self, update: &ProgressUpdate);
}

/// A no-op implementation that discards all updates.
///
/// This is the default when no observer is attached.
pub(crate) struct NoOpObserver;

impl ProgressObserver for NoOpObserver {
    fn on_update(&self, _update: &ProgressUpdate) {}
}

/// Handle identifying one fetch or conversion attempt.
///
/// Obtained from [`ProgressReporter::begin`]. A token is stale as soon as
/// a newer attempt begins; updates presented with a stale token are
/// silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptToken(u64);

struct ReporterState {
    attempt: AtomicU64,
    percent: AtomicU8,
    status: Mutex<String>,
    observer: Mutex<Arc<dyn ProgressObserver>>,
}

/// Process-wide progress and status state.
///
/// Cheaply cloneable; all clones share the same state. Each new fetch or
/// conversion attempt calls [`begin`](ProgressReporter::begin) to reset the
/// percentage and invalidate every earlier token.
#[derive(Clone)]
pub struct ProgressReporter {
    state: Arc<ReporterState>,
}

impl ProgressReporter {
    /// Create a reporter with no observer attached.
    pub fn new() -> Self {
        Self {
            state: Arc::new(ReporterState {
                attempt: AtomicU64::new(0),
                percent: AtomicU8::new(0),
                status: Mutex::new(String::new()),
                observer: Mutex::new(Arc::new(NoOpObserver)),
            }),
        }
    }

    /// Create a reporter that forwards every accepted update to `observer`.
    pub fn with_observer(observer: Arc<dyn ProgressObserver>) -> Self {
        let reporter = Self::new();
        *reporter.state.observer.lock().unwrap() = observer;
        reporter
    }

    /// Start a new attempt.
    ///
    /// Resets the percentage to 0 and invalidates all previously issued
    /// tokens.
    pub fn begin(&self) -> AttemptToken {
        let attempt = self.state.attempt.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.percent.store(0, Ordering::SeqCst);
        AttemptToken(attempt)
    }

    /// Update the status line.
    ///
    /// Ignored when `token` is stale.
    pub fn set_status(&self, token: &AttemptToken, status: impl Into<String>) {
        if self.is_stale(token) {
            return;
        }
        let status = status.into();
        log::debug!("status: {status}");
        *self.state.status.lock().unwrap() = status;
        self.notify();
    }

    /// Update the percentage, clamped to 0–100.
    ///
    /// Ignored when `token` is stale.
    pub fn set_percent(&self, token: &AttemptToken, percent: u8) {
        if self.is_stale(token) {
            return;
        }
        self.state.percent.store(percent.min(100), Ordering::SeqCst);
        self.notify();
    }

    /// Mark the attempt as successfully finished: percentage jumps to 100.
    pub fn complete(&self, token: &AttemptToken) {
        self.set_percent(token, 100);
    }

    /// Mark the attempt as failed: percentage resets to 0 and the status
    /// line carries the failure message.
    pub fn fail(&self, token: &AttemptToken, message: impl Into<String>) {
        if self.is_stale(token) {
            return;
        }
        self.state.percent.store(0, Ordering::SeqCst);
        *self.state.status.lock().unwrap() = message.into();
        self.notify();
    }

    /// The current percentage (0–100).
    pub fn percent(&self) -> u8 {
        self.state.percent.load(Ordering::SeqCst)
    }

    /// The current status line.
    pub fn status(&self) -> String {
        self.state.status.lock().unwrap().clone()
    }

    fn is_stale(&self, token: &AttemptToken) -> bool {
        self.state.attempt.load(Ordering::SeqCst) != token.0
    }

    fn notify(&self) {
        let update = ProgressUpdate {
            percent: self.percent(),
            status: self.status(),
        };
        let observer = self.state.observer.lock().unwrap().clone();
        observer.on_update(&update);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("percent", &self.percent())
            .field("status", &self.status())
            .finish()
    }
}
