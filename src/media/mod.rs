//! Media Normalizer
//!
//! Decodes arbitrary input (audio or audio+video) into a canonical
//! in-memory PCM buffer plus a playable source URL. Video containers get
//! a preview URL over the original bytes unconditionally, then audio
//! extraction is attempted through the external transcoder; if that fails
//! the container is decoded directly, because many consumer video files
//! carry a directly decodable audio track.

pub mod decode;
pub mod transcode;
pub mod url;

use std::path::Path;

use log::{info, warn};

use crate::engine::AudioBuffer;
use crate::error::{Result, SonarisError};
use url::{PlayableUrl, UrlStore};

/// Container extensions treated as video input.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "webm", "mkv", "avi"];

/// Canonical decoded media: one live instance at a time, immutable once
/// produced. The session owns it and releases its playable URLs when it is
/// superseded or cleared.
#[derive(Debug)]
pub struct MediaAsset {
    pub file_name: String,
    pub buffer: AudioBuffer,
    pub source_url: PlayableUrl,
    pub video_url: Option<PlayableUrl>,
}

impl MediaAsset {
    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.buffer.channels()
    }

    pub fn frame_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }
}

/// Check whether a path looks like a video container.
fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode a media file into a [`MediaAsset`].
///
/// Every successful call allocates exactly one playable source URL (and,
/// for video, one video-preview URL) in `urls`; the caller owns their
/// lifecycle. On failure no URL allocation survives.
///
/// # Errors
/// `SonarisError::Decode` if no decoding path accepts the payload.
pub fn normalize(path: &Path, urls: &mut UrlStore) -> Result<MediaAsset> {
    let bytes = std::fs::read(path).map_err(|e| SonarisError::Decode {
        reason: format!("failed to read {}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_owned);

    if is_video_file(path) {
        // The preview URL never requires demuxing; allocate it up front.
        let video_url = urls.alloc(bytes.clone());

        match transcode::extract_audio(path) {
            Ok(wav_bytes) => {
                let buffer = match decode::decode_bytes(wav_bytes.clone(), Some("wav")) {
                    Ok(buffer) => buffer,
                    Err(e) => {
                        urls.revoke(&video_url);
                        return Err(e);
                    }
                };
                info!(
                    "extracted audio from {}: {} frames @ {} Hz",
                    file_name,
                    buffer.len(),
                    buffer.sample_rate
                );
                let source_url = urls.alloc(wav_bytes);
                return Ok(MediaAsset {
                    file_name,
                    buffer,
                    source_url,
                    video_url: Some(video_url),
                });
            }
            Err(e) => {
                // Recovered locally; only surfaced if direct decode fails too.
                warn!("transcode failed for {}, trying direct decode: {}", file_name, e);
            }
        }

        let buffer = match decode::decode_bytes(bytes.clone(), extension.as_deref()) {
            Ok(buffer) => buffer,
            Err(e) => {
                urls.revoke(&video_url);
                return Err(e);
            }
        };
        let source_url = urls.alloc(bytes);
        return Ok(MediaAsset {
            file_name,
            buffer,
            source_url,
            video_url: Some(video_url),
        });
    }

    let buffer = decode::decode_bytes(bytes.clone(), extension.as_deref())?;
    info!(
        "decoded {}: {} ch, {} frames @ {} Hz",
        file_name,
        buffer.channels(),
        buffer.len(),
        buffer.sample_rate
    );
    let source_url = urls.alloc(bytes);
    Ok(MediaAsset {
        file_name,
        buffer,
        source_url,
        video_url: None,
    })
}
