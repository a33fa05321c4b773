//! Embedding scorer boundary
//!
//! A pluggable backend turns audio or text into a fixed-length vector for
//! similarity comparison. The deterministic fallback implements the same
//! interface so the matcher can swap it in at call time without changing
//! any caller code, and both sides are scored with the identical cosine
//! function so downstream thresholding stays uniform.

use crate::engine::buffer::rms;
use crate::error::Result;

/// Fixed partition size shared by the fallback embedding and the windowed
/// scorer.
pub const SEGMENT_COUNT: usize = 16;

/// Capability interface for an embedding backend.
pub trait EmbeddingScorer {
    /// Embed a mono PCM signal.
    fn embed_audio(&mut self, pcm: &[f32], sample_rate: u32) -> Result<Vec<f32>>;

    /// Embed a text query.
    fn embed_text(&mut self, text: &str) -> Result<Vec<f32>>;
}

/// Cosine similarity over the common prefix of two vectors.
///
/// The small denominator bias keeps the result finite for zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let mut dot = 0.0_f32;
    let mut na = 0.0_f32;
    let mut nb = 0.0_f32;
    for i in 0..len {
        dot += a[i] * b[i];
        na += a[i] * a[i];
        nb += b[i] * b[i];
    }
    dot / (na.sqrt() * nb.sqrt() + 1e-6)
}

/// Deterministic embedding fallback.
///
/// Audio reduces to [`SEGMENT_COUNT`] per-segment RMS energies; text to a
/// 16-bucket code-point histogram. Weaker evidence than a trained model,
/// but never unavailable and stable for a given input.
#[derive(Debug, Default)]
pub struct FallbackScorer;

impl EmbeddingScorer for FallbackScorer {
    fn embed_audio(&mut self, pcm: &[f32], _sample_rate: u32) -> Result<Vec<f32>> {
        let segment_length = pcm.len() / SEGMENT_COUNT;
        let mut data = vec![0.0_f32; SEGMENT_COUNT];
        for (i, value) in data.iter_mut().enumerate() {
            let start = i * segment_length;
            let end = if i == SEGMENT_COUNT - 1 {
                pcm.len()
            } else {
                start + segment_length
            };
            *value = rms(&pcm[start..end]);
        }
        Ok(data)
    }

    fn embed_text(&mut self, text: &str) -> Result<Vec<f32>> {
        let mut hash = vec![0.0_f32; SEGMENT_COUNT];
        for (i, ch) in text.chars().enumerate() {
            hash[i % SEGMENT_COUNT] += (ch as u32 % 7) as f32 / 7.0;
        }
        Ok(hash)
    }
}
