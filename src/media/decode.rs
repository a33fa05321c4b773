//! Direct audio decode via symphonia
//!
//! Decodes WAV and compressed consumer containers (MP3, AAC/M4A, FLAC,
//! Vorbis, and the audio track of MP4) to a planar PCM buffer. Many
//! consumer video files carry a directly decodable audio track, so this
//! path also serves as the fallback when the external transcoder fails.

use std::io::Cursor;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::engine::AudioBuffer;
use crate::error::{Result, SonarisError};

/// Decode raw media bytes into a PCM buffer.
///
/// # Arguments
/// * `bytes` - The full container payload
/// * `extension` - Optional file extension used as a format hint
///
/// # Errors
/// `SonarisError::Decode` if no registered decoder accepts the payload.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<AudioBuffer> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SonarisError::Decode {
            reason: format!("failed to probe format: {}", e),
            source: Some(Box::new(e)),
        })?;

    let mut format = probed.format;

    // First track with a real codec
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SonarisError::Decode {
            reason: "no audio track found".to_string(),
            source: None,
        })?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params.sample_rate.ok_or_else(|| SonarisError::Decode {
        reason: "sample rate not found".to_string(),
        source: None,
    })?;
    let channels = codec_params
        .channels
        .map(|c| c.count())
        .ok_or_else(|| SonarisError::Decode {
            reason: "channel count not found".to_string(),
            source: None,
        })?;

    debug!(
        "decoding: sample_rate={}, channels={}",
        sample_rate, channels
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| SonarisError::Decode {
            reason: format!("failed to create decoder: {}", e),
            source: Some(Box::new(e)),
        })?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                warn!("error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let buf = sample_buf.get_or_insert_with(|| {
                    SampleBuffer::new(decoded.capacity() as u64, *decoded.spec())
                });
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            Err(e) => {
                warn!("decode error: {}", e);
                continue;
            }
        }
    }

    if interleaved.is_empty() {
        return Err(SonarisError::Decode {
            reason: "decoder produced no samples".to_string(),
            source: None,
        });
    }

    // Trailing partial frames can occur on truncated streams
    let usable = interleaved.len() - interleaved.len() % channels;
    AudioBuffer::from_interleaved(&interleaved[..usable], channels, sample_rate)
}
