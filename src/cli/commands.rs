//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command. Each command runs a
//! one-shot session: load the input as the session original, derive the
//! requested value against the session generation, report, exit.

use std::path::Path;

use log::info;

use crate::error::Result;
use crate::reconstruct::{ReconstructionParams, Reconstructor};
use crate::semantic::SemanticMatcher;
use crate::serialize;
use crate::session::Session;
use crate::stt::Transcriber;

/// Decode a media file and print its canonical properties.
pub fn info(input: &Path) -> Result<()> {
    let mut session = Session::new();
    let asset = session.load_original(input)?;

    println!("File:        {}", asset.file_name);
    println!("Channels:    {}", asset.channel_count());
    println!("Sample rate: {} Hz", asset.sample_rate());
    println!("Frames:      {}", asset.frame_count());
    println!("Duration:    {:.3} s", asset.duration_secs());
    println!("Source URL:  {}", asset.source_url.as_str());
    if let Some(video_url) = &asset.video_url {
        println!("Video URL:   {}", video_url.as_str());
    }

    Ok(())
}

/// Run the reconstruction engine and write the processed WAV.
pub fn reconstruct(input: &Path, output: &Path, phase_gain: f32, blend: f32) -> Result<()> {
    let mut session = Session::new();
    let original = session.load_original(input)?.buffer.clone();
    let generation = session.generation();

    let params = ReconstructionParams { phase_gain, blend };
    info!(
        "reconstructing with phase_gain={:.2}, blend={:.2}",
        params.phase_gain, params.blend
    );

    let processed = Reconstructor::new().process(&original, &params)?;
    let wav_bytes = serialize::encode_wav(&processed)?;

    session.adopt_reconstruction(generation, processed, params, wav_bytes.clone());
    std::fs::write(output, wav_bytes)?;

    println!("Reconstruction written: {}", output.display());
    Ok(())
}

/// Search the audio for time windows matching a text query.
pub fn search(input: &Path, query: &str, json: bool) -> Result<()> {
    let mut session = Session::new();
    let buffer = session.load_original(input)?.buffer.clone();
    let generation = session.generation();

    let mut matcher = SemanticMatcher::new();
    let matches = matcher.find_matches(&buffer, query);
    session.adopt_matches(generation, query.to_string(), matches);

    if json {
        println!("{}", serde_json::to_string_pretty(session.matches())?);
        return Ok(());
    }

    if session.matches().is_empty() {
        println!("No matches for \"{}\"", query);
        return Ok(());
    }

    println!("Matches for \"{}\":", query);
    for m in session.matches() {
        println!("  {:>8.2}s - {:>8.2}s  score {:.3}", m.start, m.end, m.score);
    }
    Ok(())
}

/// Transcribe the audio (best-effort; prints a marker when unavailable).
pub fn transcribe(input: &Path) -> Result<()> {
    let mut session = Session::new();
    let buffer = session.load_original(input)?.buffer.clone();
    let generation = session.generation();

    let transcript = Transcriber::new().transcribe(&buffer);
    session.adopt_transcript(generation, transcript);

    if let Some(text) = session.transcript() {
        println!("{}", text);
    }
    Ok(())
}

/// Decode a media file and write its canonical PCM as WAV.
pub fn export(input: &Path, output: &Path) -> Result<()> {
    let mut session = Session::new();
    let asset = session.load_original(input)?;
    let wav_bytes = serialize::encode_wav(&asset.buffer)?;
    std::fs::write(output, wav_bytes)?;

    println!("Canonical PCM written: {}", output.display());
    Ok(())
}
