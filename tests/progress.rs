//! Progress reporter and attempt-token tests.

use std::sync::{Arc, Mutex};

use mp3ify::{ProgressObserver, ProgressReporter, ProgressUpdate};

// ── attempt lifecycle ──────────────────────────────────────────────

#[test]
fn begin_resets_percent() {
    let reporter = ProgressReporter::new();
    let token = reporter.begin();
    reporter.set_percent(&token, 60);
    assert_eq!(reporter.percent(), 60);

    let _newer = reporter.begin();
    assert_eq!(reporter.percent(), 0);
}

#[test]
fn stale_token_cannot_write() {
    let reporter = ProgressReporter::new();
    let stale = reporter.begin();
    let current = reporter.begin();

    reporter.set_percent(&stale, 90);
    reporter.set_status(&stale, "old attempt");
    assert_eq!(reporter.percent(), 0);
    assert_eq!(reporter.status(), "");

    reporter.set_percent(&current, 40);
    reporter.set_status(&current, "new attempt");
    assert_eq!(reporter.percent(), 40);
    assert_eq!(reporter.status(), "new attempt");
}

#[test]
fn percent_is_clamped_to_100() {
    let reporter = ProgressReporter::new();
    let token = reporter.begin();
    reporter.set_percent(&token, 250);
    assert_eq!(reporter.percent(), 100);
}

#[test]
fn complete_jumps_to_100() {
    let reporter = ProgressReporter::new();
    let token = reporter.begin();
    reporter.set_percent(&token, 30);
    reporter.complete(&token);
    assert_eq!(reporter.percent(), 100);
}

#[test]
fn fail_resets_to_zero_with_message() {
    let reporter = ProgressReporter::new();
    let token = reporter.begin();
    reporter.set_percent(&token, 70);
    reporter.fail(&token, "Transcode failed: boom");

    assert_eq!(reporter.percent(), 0);
    assert_eq!(reporter.status(), "Transcode failed: boom");
}

#[test]
fn fail_with_stale_token_is_ignored() {
    let reporter = ProgressReporter::new();
    let stale = reporter.begin();
    let current = reporter.begin();
    reporter.set_percent(&current, 55);

    reporter.fail(&stale, "late failure");
    assert_eq!(reporter.percent(), 55);
    assert_eq!(reporter.status(), "");
}

#[test]
fn clones_share_state() {
    let reporter = ProgressReporter::new();
    let clone = reporter.clone();
    let token = reporter.begin();
    clone.set_percent(&token, 80);
    assert_eq!(reporter.percent(), 80);
}

// ── observer ───────────────────────────────────────────────────────

struct RecordingObserver {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl ProgressObserver for RecordingObserver {
    fn on_update(&self, update: &ProgressUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }
}

#[test]
fn observer_sees_accepted_updates_only() {
    let recorder = Arc::new(RecordingObserver {
        updates: Mutex::new(Vec::new()),
    });
    let reporter = ProgressReporter::with_observer(recorder.clone());

    let stale = reporter.begin();
    let current = reporter.begin();
    reporter.set_percent(&stale, 99); // dropped
    reporter.set_percent(&current, 10);
    reporter.set_status(&current, "Converting to MP3…");

    let updates = recorder.updates.lock().unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].percent, 10);
    assert_eq!(updates[1].status, "Converting to MP3…");
}
