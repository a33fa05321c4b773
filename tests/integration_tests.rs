//! Integration Tests
//!
//! End-to-end tests for the Sonaris forensic audio pipeline: decode,
//! reconstruct, search, serialize, and coordinated transport over one
//! session.

use std::path::PathBuf;

use sonaris::engine::AudioBuffer;
use sonaris::media::MediaAsset;
use sonaris::reconstruct::{ReconstructionParams, Reconstructor};
use sonaris::semantic::SemanticMatcher;
use sonaris::serialize;
use sonaris::session::Session;
use sonaris::stt::{Transcriber, UNAVAILABLE_MARKER};
use sonaris::transport::{
    LoopRegion, OfflineSurface, PlaybackSurface, RegionKind, SurfaceRole, TransportCoordinator,
};

/// Helper to create a test sine wave buffer.
fn create_sine_buffer(frequency: f32, sample_rate: u32, duration_secs: f64) -> AudioBuffer {
    let num_frames = (sample_rate as f64 * duration_secs) as usize;
    let mut buffer = AudioBuffer::new(1, num_frames, sample_rate);
    for (i, s) in buffer.channel_mut(0).iter_mut().enumerate() {
        let t = i as f32 / sample_rate as f32;
        *s = 0.5 * (2.0 * std::f32::consts::PI * frequency * t).sin();
    }
    buffer
}

fn write_wav_file(buffer: &AudioBuffer, dir: &std::path::Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serialize::encode_wav(buffer).unwrap()).unwrap();
    path
}

// === Full Pipeline Tests ===

#[test]
fn test_load_reconstruct_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav_file(&create_sine_buffer(440.0, 48000, 2.0), dir.path(), "in.wav");

    let mut session = Session::new();
    let asset = session.load_original(&input).unwrap();
    assert_eq!(asset.sample_rate(), 48000);
    assert!((asset.duration_secs() - 2.0).abs() < 1e-3);
    let original = asset.buffer.clone();
    let generation = session.generation();

    let params = ReconstructionParams::default();
    let processed = Reconstructor::new().process(&original, &params).unwrap();
    assert_eq!(processed.len(), original.len());
    assert_eq!(processed.channels(), original.channels());

    let wav_bytes = serialize::encode_wav(&processed).unwrap();
    assert!(session.adopt_reconstruction(generation, processed, params, wav_bytes));

    // Original source URL plus reconstruction URL are both live
    assert_eq!(session.urls().live_count(), 2);

    // The reconstruction URL resolves to a decodable WAV image
    let url = session.reconstruction().unwrap().url.clone();
    let bytes = session.urls().resolve(&url).unwrap();
    let decoded = serialize::decode_wav(&bytes).unwrap();
    assert_eq!(decoded.len(), original.len());
}

#[test]
fn test_wav_round_trip_within_quantization_step() {
    let buffer = create_sine_buffer(440.0, 48000, 1.0);
    let bytes = serialize::encode_wav(&buffer).unwrap();
    let decoded = serialize::decode_wav(&bytes).unwrap();

    assert_eq!(decoded.sample_rate, 48000);
    assert_eq!(decoded.len(), buffer.len());
    for (a, b) in buffer.channel(0).iter().zip(decoded.channel(0)) {
        assert!(
            (a - b).abs() <= 1.0 / 32768.0,
            "sample drifted beyond one quantization step: {} vs {}",
            a,
            b
        );
    }
}

#[test]
fn test_search_produces_in_bounds_matches_on_loaded_audio() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav_file(&create_sine_buffer(440.0, 48000, 8.0), dir.path(), "in.wav");

    let mut session = Session::new();
    let buffer = session.load_original(&input).unwrap().buffer.clone();
    let generation = session.generation();

    let matches = SemanticMatcher::new().find_matches(&buffer, "steady tone");
    assert!(!matches.is_empty());
    for m in &matches {
        assert!(m.start < m.end);
        assert!(m.end <= buffer.duration_secs() + 1e-9);
    }

    assert!(session.adopt_matches(generation, "steady tone".to_string(), matches.clone()));
    assert_eq!(session.matches().len(), matches.len());
}

#[test]
fn test_transcription_degrades_to_marker() {
    let buffer = create_sine_buffer(200.0, 48000, 1.0);
    let text = Transcriber::new().transcribe(&buffer);
    assert_eq!(text, UNAVAILABLE_MARKER);
}

// === Generation Guard Tests ===

#[test]
fn test_stale_reconstruction_discarded_after_new_load() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_wav_file(&create_sine_buffer(440.0, 48000, 2.0), dir.path(), "a.wav");
    let second = write_wav_file(&create_sine_buffer(220.0, 48000, 3.0), dir.path(), "b.wav");

    let mut session = Session::new();
    let buffer = session.load_original(&first).unwrap().buffer.clone();
    let stale_generation = session.generation();

    // A reconstruction is "in flight" when a second file is loaded
    let params = ReconstructionParams::default();
    let processed = Reconstructor::new().process(&buffer, &params).unwrap();
    let wav_bytes = serialize::encode_wav(&processed).unwrap();

    session.load_original(&second).unwrap();
    assert!(!session.adopt_reconstruction(stale_generation, processed, params, wav_bytes));
    assert!(session.reconstruction().is_none());
    // Only the second original's source URL is live
    assert_eq!(session.urls().live_count(), 1);
    assert_eq!(session.original().unwrap().file_name, "b.wav");
}

#[test]
fn test_replace_and_release_over_session_lifetime() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_wav_file(&create_sine_buffer(440.0, 48000, 1.0), dir.path(), "a.wav");
    let second = write_wav_file(&create_sine_buffer(220.0, 48000, 1.0), dir.path(), "b.wav");

    let mut session = Session::new();
    session.load_original(&first).unwrap();
    let first_url = session.original().unwrap().source_url.clone();

    session.load_original(&second).unwrap();
    assert!(session.urls().resolve(&first_url).is_none());
    assert_eq!(session.urls().live_count(), 1);

    session.clear();
    assert_eq!(session.urls().live_count(), 0);
    assert!(session.original().is_none());
}

// === Transport Tests ===

fn transport_for(session: &Session) -> TransportCoordinator<OfflineSurface> {
    let asset: &MediaAsset = session.original().unwrap();
    let mut transport = TransportCoordinator::new(OfflineSurface::new(), OfflineSurface::new());
    transport.load_original(asset.source_url.as_str(), asset.duration_secs());
    transport
}

#[test]
fn test_loop_wraparound_reseeks_and_resumes_both_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav_file(&create_sine_buffer(440.0, 48000, 20.0), dir.path(), "in.wav");
    let mut session = Session::new();
    session.load_original(&input).unwrap();

    let mut transport = transport_for(&session);
    transport.load_reconstructed("mem://processed", 20.0);
    transport.set_loop_region(Some(LoopRegion {
        start: 2.0,
        end: 4.0,
    }));
    transport.play_pause();

    // Simulate the clock running just past the loop end
    transport.on_time_update(4.1);
    assert!((transport.original().current_time() - 2.0).abs() < 1e-9);
    assert!((transport.reconstructed().current_time() - 2.0).abs() < 1e-9);
    assert!(transport.original().is_playing());
    assert!(transport.reconstructed().is_playing());
}

#[test]
fn test_click_to_loop_window_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav_file(&create_sine_buffer(440.0, 48000, 20.0), dir.path(), "in.wav");
    let mut session = Session::new();
    session.load_original(&input).unwrap();

    let mut transport = transport_for(&session);

    transport.click_at(SurfaceRole::Interactive, 10.0);
    let region = transport.loop_region().unwrap();
    assert!((region.start - 9.75).abs() < 1e-9);
    assert!((region.end - 10.5).abs() < 1e-9);

    // Near the start the window clamps to [0, 0.75]
    transport.click_at(SurfaceRole::Interactive, 0.1);
    let region = transport.loop_region().unwrap();
    assert_eq!(region.start, 0.0);
    assert!((region.end - 0.75).abs() < 1e-9);
}

#[test]
fn test_jump_clamps_out_of_range_times() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav_file(&create_sine_buffer(440.0, 48000, 10.0), dir.path(), "in.wav");
    let mut session = Session::new();
    session.load_original(&input).unwrap();

    let mut transport = transport_for(&session);
    transport.load_reconstructed("mem://processed", 10.0);

    transport.jump_to_time(-5.0);
    assert_eq!(transport.original().current_time(), 0.0);
    assert_eq!(transport.reconstructed().current_time(), 0.0);
}

#[test]
fn test_search_matches_feed_transport_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav_file(&create_sine_buffer(440.0, 48000, 8.0), dir.path(), "in.wav");
    let mut session = Session::new();
    let buffer = session.load_original(&input).unwrap().buffer.clone();
    let generation = session.generation();

    let matches = SemanticMatcher::new().find_matches(&buffer, "steady tone");
    session.adopt_matches(generation, "steady tone".to_string(), matches);

    let mut transport = transport_for(&session);
    transport.set_matches(session.matches().to_vec());
    assert_eq!(transport.overlay().len(), session.matches().len());
    assert!(transport
        .overlay()
        .iter()
        .all(|r| !r.editable && matches!(r.kind, RegionKind::Semantic(_))));

    // Adding a loop region keeps the semantic overlay intact
    transport.click_at(SurfaceRole::Interactive, 2.0);
    assert_eq!(transport.overlay().len(), session.matches().len() + 1);
}
