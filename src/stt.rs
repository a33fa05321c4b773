//! Speech-to-text boundary
//!
//! Transcription is strictly best-effort: a missing or failing recognition
//! backend degrades to a fixed marker string instead of an error, so the
//! rest of the pipeline never blocks on it. Audio is resampled to the
//! 16 kHz mono signal recognition models expect before it crosses the
//! boundary.

use log::warn;

use crate::engine::AudioBuffer;
use crate::error::Result;

/// Transcript stand-in when no recognition backend produced text.
pub const UNAVAILABLE_MARKER: &str = "[transcription unavailable]";

/// Sample rate expected by recognition backends.
pub const STT_SAMPLE_RATE: u32 = 16_000;

/// Capability interface for a speech recognition backend.
pub trait SpeechToText {
    /// Transcribe a mono 16 kHz PCM signal.
    fn transcribe(&mut self, pcm_16k: &[f32]) -> Result<String>;
}

/// Factory producing a recognition backend, invoked lazily on first use.
pub type SttFactory = Box<dyn Fn() -> Result<Box<dyn SpeechToText>> + Send>;

/// Linear-interpolation resample to [`STT_SAMPLE_RATE`].
pub fn resample_to_16k(pcm: &[f32], sample_rate: u32) -> Vec<f32> {
    if sample_rate == STT_SAMPLE_RATE || pcm.is_empty() {
        return pcm.to_vec();
    }

    let ratio = sample_rate as f64 / STT_SAMPLE_RATE as f64;
    let out_len = (pcm.len() as f64 / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;
        let a = pcm[idx];
        let b = pcm[(idx + 1).min(pcm.len() - 1)];
        out.push(a * (1.0 - frac) + b * frac);
    }
    out
}

/// Best-effort transcriber with a lazily initialized backend.
pub struct Transcriber {
    factory: Option<SttFactory>,
    backend: Option<Box<dyn SpeechToText>>,
}

impl Default for Transcriber {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcriber {
    /// A transcriber with no backend; every call yields the marker.
    pub fn new() -> Self {
        Self {
            factory: None,
            backend: None,
        }
    }

    pub fn with_backend_factory(factory: SttFactory) -> Self {
        Self {
            factory: Some(factory),
            backend: None,
        }
    }

    fn backend(&mut self) -> Option<&mut Box<dyn SpeechToText>> {
        if self.backend.is_none() {
            if let Some(factory) = &self.factory {
                match factory() {
                    Ok(backend) => self.backend = Some(backend),
                    Err(e) => warn!("recognition backend unavailable: {}", e),
                }
            }
        }
        self.backend.as_mut()
    }

    /// Transcribe the first channel of a buffer.
    ///
    /// Never fails: backend errors and empty recognizer output both yield
    /// [`UNAVAILABLE_MARKER`].
    pub fn transcribe(&mut self, buffer: &AudioBuffer) -> String {
        if buffer.channels() == 0 || buffer.is_empty() {
            return UNAVAILABLE_MARKER.to_string();
        }

        let pcm = resample_to_16k(buffer.channel(0), buffer.sample_rate);
        if let Some(backend) = self.backend() {
            match backend.transcribe(&pcm) {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => warn!("recognizer returned empty transcript"),
                Err(e) => warn!("transcription failed: {}", e),
            }
        }
        UNAVAILABLE_MARKER.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SonarisError;

    #[test]
    fn test_resample_identity_at_16k() {
        let pcm = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_to_16k(&pcm, 16_000), pcm);
    }

    #[test]
    fn test_resample_downsamples_by_rate_ratio() {
        let pcm = vec![0.5; 48_000];
        let out = resample_to_16k(&pcm, 48_000);
        assert_eq!(out.len(), 16_000);
        // A constant signal survives interpolation unchanged
        assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_resample_interpolates_between_samples() {
        // 32 kHz ramp: every output sample lands between two inputs
        let pcm: Vec<f32> = (0..32).map(|i| i as f32).collect();
        let out = resample_to_16k(&pcm, 32_000);
        assert_eq!(out.len(), 16);
        assert!((out[1] - 2.0).abs() < 1e-6);
        assert!((out[7] - 14.0).abs() < 1e-6);
    }

    #[test]
    fn test_resample_empty() {
        assert!(resample_to_16k(&[], 48_000).is_empty());
    }

    fn speech_buffer() -> AudioBuffer {
        let mut buffer = AudioBuffer::new(1, 48_000, 48_000);
        for (i, s) in buffer.channel_mut(0).iter_mut().enumerate() {
            *s = 0.2 * (2.0 * std::f32::consts::PI * 200.0 * i as f32 / 48_000.0).sin();
        }
        buffer
    }

    #[test]
    fn test_no_backend_yields_marker() {
        let mut transcriber = Transcriber::new();
        assert_eq!(transcriber.transcribe(&speech_buffer()), UNAVAILABLE_MARKER);
    }

    #[test]
    fn test_failing_backend_yields_marker() {
        struct Failing;
        impl SpeechToText for Failing {
            fn transcribe(&mut self, _pcm: &[f32]) -> crate::Result<String> {
                Err(SonarisError::ScorerUnavailable {
                    reason: "model not loaded".to_string(),
                })
            }
        }
        let mut transcriber = Transcriber::with_backend_factory(Box::new(|| {
            Ok(Box::new(Failing) as Box<dyn SpeechToText>)
        }));
        assert_eq!(transcriber.transcribe(&speech_buffer()), UNAVAILABLE_MARKER);
    }

    #[test]
    fn test_backend_receives_16k_audio_and_text_passes_through() {
        struct Echo;
        impl SpeechToText for Echo {
            fn transcribe(&mut self, pcm_16k: &[f32]) -> crate::Result<String> {
                assert_eq!(pcm_16k.len(), 16_000);
                Ok("hello from the well".to_string())
            }
        }
        let mut transcriber =
            Transcriber::with_backend_factory(Box::new(|| Ok(Box::new(Echo) as Box<dyn SpeechToText>)));
        assert_eq!(
            transcriber.transcribe(&speech_buffer()),
            "hello from the well"
        );
    }

    #[test]
    fn test_empty_recognizer_output_yields_marker() {
        struct Silent;
        impl SpeechToText for Silent {
            fn transcribe(&mut self, _pcm: &[f32]) -> crate::Result<String> {
                Ok("   ".to_string())
            }
        }
        let mut transcriber = Transcriber::with_backend_factory(Box::new(|| {
            Ok(Box::new(Silent) as Box<dyn SpeechToText>)
        }));
        assert_eq!(transcriber.transcribe(&speech_buffer()), UNAVAILABLE_MARKER);
    }

    #[test]
    fn test_empty_buffer_yields_marker() {
        let mut transcriber = Transcriber::new();
        let buffer = AudioBuffer::new(1, 0, 48_000);
        assert_eq!(transcriber.transcribe(&buffer), UNAVAILABLE_MARKER);
    }
}
