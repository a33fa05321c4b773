//! External transcoder boundary
//!
//! Video-to-audio extraction is delegated to an ffmpeg process: downmix to
//! mono, resample to 48 kHz, select the first audio stream, emit WAV. Any
//! failure here (binary missing, unsupported codec, nonzero exit) is
//! reported as `SonarisError::Transcode` and recovered by the caller's
//! direct-decode fallback; it never reaches the user on its own.

use std::path::Path;

use ffmpeg_sidecar::command::FfmpegCommand;
use log::debug;

use crate::error::{Result, SonarisError};

/// Target sample rate requested from the transcoder.
pub const EXTRACT_SAMPLE_RATE: u32 = 48_000;

/// Extract the first audio stream of a video container as mono 48 kHz WAV
/// bytes.
///
/// # Arguments
/// * `input` - Path to the video container on disk
///
/// # Errors
/// `SonarisError::Transcode` if the tool cannot be spawned, exits with a
/// failure status, or produces no output.
pub fn extract_audio(input: &Path) -> Result<Vec<u8>> {
    let workdir = scratch_dir()?;
    // The scratch dir is removed on every exit path, success or error.
    let result = run_extraction(input, &workdir);
    let _ = std::fs::remove_dir_all(&workdir);
    result
}

fn run_extraction(input: &Path, workdir: &Path) -> Result<Vec<u8>> {
    let output = workdir.join("extracted.wav");

    debug!("extracting audio via ffmpeg: {}", input.display());

    let rate = EXTRACT_SAMPLE_RATE.to_string();
    let status = FfmpegCommand::new()
        .hide_banner()
        .overwrite()
        .input(input.to_string_lossy())
        .args(["-ac", "1", "-ar", rate.as_str(), "-map", "0:a:0"])
        .output(output.to_string_lossy())
        .spawn()
        .map_err(|e| SonarisError::Transcode {
            reason: format!("failed to spawn ffmpeg: {}", e),
        })?
        .wait()
        .map_err(|e| SonarisError::Transcode {
            reason: format!("ffmpeg did not run to completion: {}", e),
        })?;

    if !status.success() {
        return Err(SonarisError::Transcode {
            reason: format!("ffmpeg exited with status {}", status),
        });
    }

    let bytes = std::fs::read(&output).map_err(|e| SonarisError::Transcode {
        reason: format!("failed to read extracted audio: {}", e),
    })?;

    if bytes.is_empty() {
        return Err(SonarisError::Transcode {
            reason: "transcoder produced no output".to_string(),
        });
    }

    Ok(bytes)
}

/// Create a private scratch directory for one extraction run.
fn scratch_dir() -> Result<std::path::PathBuf> {
    let dir = std::env::temp_dir().join(format!("sonaris-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).map_err(|e| SonarisError::Transcode {
        reason: format!("failed to create scratch directory: {}", e),
    })?;
    Ok(dir)
}
