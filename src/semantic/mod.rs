//! Semantic Matcher
//!
//! Given a PCM buffer and a text query, produces time windows where the
//! audio plausibly matches the query. A global audio/text similarity from
//! the embedding scorer is combined with per-window RMS energy; windows
//! above threshold become matches, ordered by onset time. Scorer failures
//! are never surfaced: the deterministic fallback takes over transparently.

pub mod scorer;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::engine::buffer::rms;
use crate::engine::AudioBuffer;
use crate::error::Result;
use scorer::{cosine_similarity, EmbeddingScorer, FallbackScorer, SEGMENT_COUNT};

/// Weight of the global similarity in the combined window score.
const SIMILARITY_WEIGHT: f32 = 0.7;
/// Weight of the window energy in the combined window score.
const ENERGY_WEIGHT: f32 = 0.3;
/// Windows at or below this combined score are dropped entirely.
const SCORE_THRESHOLD: f32 = 0.2;
/// Minimum window length in seconds.
const MIN_WINDOW_SECS: f64 = 0.5;

/// One time window where the audio plausibly matches the query.
///
/// `score` is used downstream only for visual intensity, never for
/// ranking beyond the emission threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemanticMatch {
    pub start: f64,
    pub end: f64,
    pub score: f32,
}

/// Factory producing a primary embedding backend.
///
/// Invoked lazily on first use; a failure is not latched, so the next
/// search retries initialization.
pub type ScorerFactory = Box<dyn Fn() -> Result<Box<dyn EmbeddingScorer>> + Send>;

/// The semantic matcher with its memoized primary scorer.
pub struct SemanticMatcher {
    factory: Option<ScorerFactory>,
    backend: Option<Box<dyn EmbeddingScorer>>,
    fallback: FallbackScorer,
}

impl Default for SemanticMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticMatcher {
    /// A matcher with no primary backend; every search uses the fallback.
    pub fn new() -> Self {
        Self {
            factory: None,
            backend: None,
            fallback: FallbackScorer,
        }
    }

    /// A matcher that initializes its primary backend lazily from the
    /// given factory, degrading to the fallback whenever the backend is
    /// unavailable or throws.
    pub fn with_backend_factory(factory: ScorerFactory) -> Self {
        Self {
            factory: Some(factory),
            backend: None,
            fallback: FallbackScorer,
        }
    }

    /// Lazy memoized backend initialization. Failure selects the fallback
    /// for the current call only.
    fn backend(&mut self) -> Option<&mut Box<dyn EmbeddingScorer>> {
        if self.backend.is_none() {
            if let Some(factory) = &self.factory {
                match factory() {
                    Ok(scorer) => self.backend = Some(scorer),
                    Err(e) => warn!("embedding backend unavailable, using fallback: {}", e),
                }
            }
        }
        self.backend.as_mut()
    }

    fn embed_audio(&mut self, pcm: &[f32], sample_rate: u32) -> Vec<f32> {
        if let Some(backend) = self.backend() {
            match backend.embed_audio(pcm, sample_rate) {
                Ok(embedding) => return embedding,
                Err(e) => warn!("audio embedding fallback: {}", e),
            }
        }
        // The fallback never errors; an empty vector would score as zero.
        self.fallback.embed_audio(pcm, sample_rate).unwrap_or_default()
    }

    fn embed_text(&mut self, text: &str) -> Vec<f32> {
        if let Some(backend) = self.backend() {
            match backend.embed_text(text) {
                Ok(embedding) => return embedding,
                Err(e) => warn!("text embedding fallback: {}", e),
            }
        }
        self.fallback.embed_text(text).unwrap_or_default()
    }

    /// Find time windows matching the query, ordered by onset time.
    ///
    /// An empty or whitespace query yields an empty result without
    /// invoking any scorer. The returned list replaces any previous one
    /// wholesale; matches are never merged incrementally.
    pub fn find_matches(&mut self, buffer: &AudioBuffer, query: &str) -> Vec<SemanticMatch> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        if buffer.channels() == 0 || buffer.is_empty() {
            return Vec::new();
        }

        let channel = buffer.channel(0);
        let audio_embedding = self.embed_audio(channel, buffer.sample_rate);
        let text_embedding = self.embed_text(query);
        let base_score = cosine_similarity(&audio_embedding, &text_embedding);
        debug!("semantic base score: {:.3}", base_score);

        // Fixed-count partition; each window covers at least half a second.
        let window_secs = (buffer.duration_secs() / SEGMENT_COUNT as f64).max(MIN_WINDOW_SECS);
        let samples_per_window = (buffer.sample_rate as f64 * window_secs).floor() as usize;
        let sample_rate = buffer.sample_rate as f64;

        let mut matches = Vec::new();
        for i in 0..SEGMENT_COUNT {
            let start_sample = i * samples_per_window;
            if start_sample >= channel.len() {
                break;
            }
            let end_sample = (start_sample + samples_per_window).min(channel.len());

            let energy_score = (rms(&channel[start_sample..end_sample]) * 12.0).min(1.0);
            let combined =
                base_score.max(0.0) * SIMILARITY_WEIGHT + energy_score * ENERGY_WEIGHT;
            if combined > SCORE_THRESHOLD {
                matches.push(SemanticMatch {
                    start: start_sample as f64 / sample_rate,
                    end: end_sample as f64 / sample_rate,
                    score: combined,
                });
            }
        }
        matches
    }
}

// ============================================================================
// Tests
// ============================================================================
