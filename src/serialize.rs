//! WAV serialization
//!
//! Encodes a PCM buffer as a complete 16-bit little-endian PCM WAV image
//! in memory, preserving channel count and sample rate. The quantizer is
//! asymmetric on purpose: negative amplitudes scale by 32768 and
//! non-negative ones by 32767, so both rails map onto representable
//! 16-bit values without overflow.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::AudioBuffer;
use crate::error::{Result, SonarisError};

fn map_wav_error(e: hound::Error) -> SonarisError {
    match e {
        hound::Error::IoError(io) => SonarisError::Io(io),
        other => SonarisError::Decode {
            reason: other.to_string(),
            source: None,
        },
    }
}

/// Quantize one float sample to signed 16-bit PCM.
fn quantize(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

/// Encode a buffer as an in-memory WAV image.
///
/// Channel count and sample rate carry through unchanged; out-of-range
/// samples are clamped before quantization rather than wrapped.
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    if buffer.channels() == 0 {
        return Err(SonarisError::InvalidAudio {
            reason: "cannot encode a buffer with no channels".to_string(),
        });
    }

    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(map_wav_error)?;
        for frame in 0..buffer.len() {
            for ch in 0..buffer.channels() {
                writer
                    .write_sample(quantize(buffer.channel(ch)[frame]))
                    .map_err(map_wav_error)?;
            }
        }
        writer.finalize().map_err(map_wav_error)?;
    }
    Ok(cursor.into_inner())
}

/// Decode a WAV image back into a planar float buffer.
///
/// Accepts 16-bit integer and 32-bit float PCM. Integer samples are
/// rescaled with the inverse of the encoder's asymmetric quantizer.
pub fn decode_wav(bytes: &[u8]) -> Result<AudioBuffer> {
    let mut reader = WavReader::new(Cursor::new(bytes)).map_err(map_wav_error)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(SonarisError::Decode {
            reason: "wav header declares zero channels".to_string(),
            source: None,
        });
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| {
                s.map(|v| {
                    if v < 0 {
                        v as f32 / 32768.0
                    } else {
                        v as f32 / 32767.0
                    }
                })
                .map_err(map_wav_error)
            })
            .collect::<Result<_>>()?,
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map_err(map_wav_error))
            .collect::<Result<_>>()?,
        (format, bits) => {
            return Err(SonarisError::Decode {
                reason: format!("unsupported wav sample format: {:?} {} bit", format, bits),
                source: None,
            })
        }
    };

    AudioBuffer::from_interleaved(&interleaved, channels, spec.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_rails_and_clamp() {
        assert_eq!(quantize(-1.0), -32768);
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(0.0), 0);
        // Out-of-range input clamps instead of wrapping
        assert_eq!(quantize(-3.5), -32768);
        assert_eq!(quantize(2.0), 32767);
    }

    #[test]
    fn test_round_trip_preserves_shape_and_amplitude() {
        let mut buffer = AudioBuffer::new(2, 4800, 48000);
        for ch in 0..2 {
            for (i, s) in buffer.channel_mut(ch).iter_mut().enumerate() {
                *s = 0.8 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin();
            }
        }

        let bytes = encode_wav(&buffer).unwrap();
        let decoded = decode_wav(&bytes).unwrap();

        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.sample_rate, 48000);
        assert_eq!(decoded.len(), 4800);
        for ch in 0..2 {
            for (a, b) in buffer.channel(ch).iter().zip(decoded.channel(ch)) {
                assert!((a - b).abs() <= 1.0 / 32768.0);
            }
        }
    }

    #[test]
    fn test_mono_rate_preserved() {
        let buffer = AudioBuffer::new(1, 22050, 22050);
        let bytes = encode_wav(&buffer).unwrap();
        let decoded = decode_wav(&bytes).unwrap();
        assert_eq!(decoded.channels(), 1);
        assert_eq!(decoded.sample_rate, 22050);
        assert!((decoded.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_channel_buffer_rejected() {
        let buffer = AudioBuffer {
            samples: Vec::new(),
            sample_rate: 48000,
        };
        assert!(matches!(
            encode_wav(&buffer),
            Err(SonarisError::InvalidAudio { .. })
        ));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(decode_wav(b"definitely not a riff").is_err());
    }
}
