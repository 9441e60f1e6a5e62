//! Download materializer tests.

use mp3ify::{ConversionResult, Materializer};

fn result(name: &str, bytes: &[u8]) -> ConversionResult {
    ConversionResult {
        bytes: bytes.to_vec(),
        suggested_filename: name.to_string(),
    }
}

// ── presentation ───────────────────────────────────────────────────

#[test]
fn present_writes_the_artifact_under_its_suggested_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let materializer = Materializer::new(dir.path());

    let handle = materializer
        .present(&result("song.mp3", b"mp3-bytes"))
        .expect("present");

    assert_eq!(handle.filename, "song.mp3");
    assert_eq!(handle.mime(), "audio/mpeg");
    assert!(!handle.is_revoked());
    assert_eq!(std::fs::read(&handle.path).expect("read artifact"), b"mp3-bytes");
    assert_eq!(handle.path.file_name().unwrap(), "song.mp3");
}

#[test]
fn present_creates_the_target_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("out").join("mp3");
    let materializer = Materializer::new(&nested);

    let handle = materializer
        .present(&result("song.mp3", b"x"))
        .expect("present");
    assert!(handle.path.starts_with(&nested));
    assert!(handle.path.exists());
}

#[test]
fn crafted_names_cannot_escape_the_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let materializer = Materializer::new(dir.path());

    let handle = materializer
        .present(&result("../escape.mp3", b"x"))
        .expect("present");
    assert!(handle.path.starts_with(dir.path()));
    assert_eq!(handle.path.file_name().unwrap(), "escape.mp3");
}

// ── supersession ───────────────────────────────────────────────────

#[test]
fn new_presentation_revokes_the_previous_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let materializer = Materializer::new(dir.path());

    let first = materializer
        .present(&result("first.mp3", b"one"))
        .expect("present first");
    let second = materializer
        .present(&result("second.mp3", b"two"))
        .expect("present second");

    assert!(!first.path.exists(), "superseded artifact should be revoked");
    assert!(second.path.exists());
}

#[test]
fn retain_all_keeps_every_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let materializer = Materializer::new(dir.path()).retain_all();

    let first = materializer
        .present(&result("first.mp3", b"one"))
        .expect("present first");
    let second = materializer
        .present(&result("second.mp3", b"two"))
        .expect("present second");

    assert!(first.path.exists());
    assert!(second.path.exists());
}

#[test]
fn re_presenting_the_same_name_overwrites_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    let materializer = Materializer::new(dir.path());

    let first = materializer
        .present(&result("song.mp3", b"old"))
        .expect("present");
    let second = materializer
        .present(&result("song.mp3", b"new"))
        .expect("re-present");

    assert_eq!(first.path, second.path);
    assert_eq!(std::fs::read(&second.path).expect("read"), b"new");
}

// ── revocation ─────────────────────────────────────────────────────

#[test]
fn revoke_removes_the_artifact_and_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let materializer = Materializer::new(dir.path());

    let mut handle = materializer
        .present(&result("song.mp3", b"bytes"))
        .expect("present");
    let path = handle.path.clone();

    handle.revoke();
    assert!(handle.is_revoked());
    assert!(!path.exists());

    handle.revoke(); // second call is a no-op
    assert!(handle.is_revoked());
}
