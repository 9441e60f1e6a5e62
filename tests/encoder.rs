//! FfmpegEncoder tests.
//!
//! Tests that drive a real transcode are skipped when no `ffmpeg` binary
//! is available on PATH.

use std::sync::Mutex;

use mp3ify::encoder::TranscodeOptions;
use mp3ify::{Bitrate, Encoder, FfmpegEncoder, Mp3ifyError};

fn ffmpeg_available() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// A minimal valid WAV: 0.1 s of 8 kHz mono 16-bit silence.
fn tiny_wav() -> Vec<u8> {
    let samples: u32 = 800;
    let data_len = samples * 2;
    let mut wav = Vec::with_capacity(44 + data_len as usize);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16_u32.to_le_bytes()); // PCM header size
    wav.extend_from_slice(&1_u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1_u16.to_le_bytes()); // mono
    wav.extend_from_slice(&8000_u32.to_le_bytes()); // sample rate
    wav.extend_from_slice(&16000_u32.to_le_bytes()); // byte rate
    wav.extend_from_slice(&2_u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16_u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}

// ── lifecycle without a binary ─────────────────────────────────────

#[tokio::test]
async fn encoder_starts_uninitialized() {
    let encoder = FfmpegEncoder::new();
    assert!(!encoder.is_initialized());
}

#[tokio::test]
async fn operations_before_initialize_are_rejected() {
    let encoder = FfmpegEncoder::new();
    let result = encoder.write_file("input.wav", b"bytes").await;
    assert!(matches!(result, Err(Mp3ifyError::EncoderInit(_))));
}

#[tokio::test]
async fn initialize_fails_for_a_missing_binary() {
    let encoder = FfmpegEncoder::new().with_binary("definitely-not-ffmpeg-zzz");
    let result = encoder.initialize().await;
    assert!(matches!(result, Err(Mp3ifyError::EncoderInit(_))));
    assert!(!encoder.is_initialized());
}

#[tokio::test]
async fn stage_names_are_a_flat_namespace() {
    let encoder = FfmpegEncoder::new();
    for name in ["nested/name.wav", "..", ".", "", "back\\slash.wav"] {
        let result = encoder.write_file(name, b"x").await;
        assert!(
            matches!(result, Err(Mp3ifyError::InvalidStageName(_))),
            "expected InvalidStageName for {name:?}",
        );
    }
}

// ── with a real binary ─────────────────────────────────────────────

#[tokio::test]
async fn staging_round_trip_on_the_working_filesystem() {
    if !ffmpeg_available() {
        return;
    }

    let encoder = FfmpegEncoder::new();
    encoder.initialize().await.expect("initialize");
    assert!(encoder.is_initialized());

    // Idempotent: a second initialize is a no-op.
    encoder.initialize().await.expect("re-initialize");

    let payload = tiny_wav();
    encoder.write_file("input.wav", &payload).await.expect("write");
    let read_back = encoder.read_file("input.wav").await.expect("read");
    assert_eq!(read_back, payload);

    encoder.unlink("input.wav").await.expect("unlink");
    assert!(encoder.read_file("input.wav").await.is_err());
}

#[tokio::test]
async fn transcode_produces_mp3_bytes_and_final_progress() {
    if !ffmpeg_available() {
        return;
    }

    let encoder = FfmpegEncoder::new();
    encoder.initialize().await.expect("initialize");
    encoder
        .write_file("input.wav", &tiny_wav())
        .await
        .expect("write");

    let ratios = Mutex::new(Vec::new());
    let options = TranscodeOptions {
        bitrate: Bitrate::Kbps128,
    };
    encoder
        .transcode("input.wav", "output.mp3", &options, &|ratio| {
            ratios.lock().unwrap().push(ratio);
        })
        .await
        .expect("transcode");

    let output = encoder.read_file("output.mp3").await.expect("read output");
    assert!(!output.is_empty());

    let ratios = ratios.into_inner().unwrap();
    assert!(!ratios.is_empty(), "expected progress callbacks");
    assert!(ratios.iter().all(|ratio| (0.0..=1.0).contains(ratio)));

    encoder.unlink("input.wav").await.expect("unlink input");
    encoder.unlink("output.mp3").await.expect("unlink output");
}

#[tokio::test]
async fn transcode_of_garbage_input_fails() {
    if !ffmpeg_available() {
        return;
    }

    let encoder = FfmpegEncoder::new();
    encoder.initialize().await.expect("initialize");
    encoder
        .write_file("input.bin", b"this is not audio at all")
        .await
        .expect("write");

    let options = TranscodeOptions::default();
    let result = encoder
        .transcode("input.bin", "output.mp3", &options, &|_| {})
        .await;
    assert!(matches!(result, Err(Mp3ifyError::Transcode(_))));
}
