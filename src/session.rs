//! Session state
//!
//! One record owns every live value in the pipeline: the decoded original,
//! the current reconstruction, the semantic match list, and the transcript.
//! Replacement is replace-and-release: adopting a new value revokes the
//! playable URLs of the value it supersedes, exactly once.
//!
//! Long-running derivations (reconstruction, search, transcription) are
//! guarded by a generation counter. The caller snapshots the generation
//! before starting work and passes it back with the result; if a new
//! original was adopted in between, the stale result is discarded without
//! touching session state.

use std::path::Path;

use log::{debug, info};

use crate::engine::AudioBuffer;
use crate::error::Result;
use crate::media::url::{PlayableUrl, UrlStore};
use crate::media::{self, MediaAsset};
use crate::reconstruct::ReconstructionParams;
use crate::semantic::SemanticMatch;

/// A processed rendition of the original, with its own playable URL.
#[derive(Debug)]
pub struct ReconstructedAsset {
    pub buffer: AudioBuffer,
    pub params: ReconstructionParams,
    pub url: PlayableUrl,
}

/// The single owner of all live pipeline values.
#[derive(Debug, Default)]
pub struct Session {
    urls: UrlStore,
    generation: u64,
    original: Option<MediaAsset>,
    reconstruction: Option<ReconstructedAsset>,
    query: String,
    matches: Vec<SemanticMatch>,
    transcript: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation. Snapshot this before starting a derivation and
    /// pass it back with the result.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn urls(&self) -> &UrlStore {
        &self.urls
    }

    pub fn urls_mut(&mut self) -> &mut UrlStore {
        &mut self.urls
    }

    pub fn original(&self) -> Option<&MediaAsset> {
        self.original.as_ref()
    }

    pub fn reconstruction(&self) -> Option<&ReconstructedAsset> {
        self.reconstruction.as_ref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[SemanticMatch] {
        &self.matches
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// Decode a file and adopt it as the new original.
    ///
    /// On failure the previous session state is left untouched.
    pub fn load_original(&mut self, path: &Path) -> Result<&MediaAsset> {
        let asset = media::normalize(path, &mut self.urls)?;
        Ok(self.adopt_original(asset))
    }

    /// Adopt a decoded asset as the new original.
    ///
    /// Bumps the generation (orphaning in-flight derivations), releases the
    /// superseded original's URLs along with every value derived from it.
    pub fn adopt_original(&mut self, asset: MediaAsset) -> &MediaAsset {
        self.generation += 1;
        info!(
            "session adopts {} (generation {})",
            asset.file_name, self.generation
        );

        if let Some(previous) = self.original.take() {
            self.urls.revoke(&previous.source_url);
            if let Some(video_url) = &previous.video_url {
                self.urls.revoke(video_url);
            }
        }
        self.release_derived();
        self.original.insert(asset)
    }

    /// Adopt a reconstruction produced against generation `generation`.
    ///
    /// Returns false (and changes nothing) if the original was replaced
    /// while the work ran. Otherwise the previous reconstruction's URL is
    /// released and a fresh one is allocated over `wav_bytes`.
    pub fn adopt_reconstruction(
        &mut self,
        generation: u64,
        buffer: AudioBuffer,
        params: ReconstructionParams,
        wav_bytes: Vec<u8>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                "discarding stale reconstruction (generation {} != {})",
                generation, self.generation
            );
            return false;
        }

        if let Some(previous) = self.reconstruction.take() {
            self.urls.revoke(&previous.url);
        }
        let url = self.urls.alloc(wav_bytes);
        self.reconstruction = Some(ReconstructedAsset {
            buffer,
            params,
            url,
        });
        true
    }

    /// Adopt a semantic match list produced against generation
    /// `generation`. The list replaces the previous one wholesale; stale
    /// results are discarded.
    pub fn adopt_matches(
        &mut self,
        generation: u64,
        query: String,
        matches: Vec<SemanticMatch>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                "discarding stale match list (generation {} != {})",
                generation, self.generation
            );
            return false;
        }
        self.query = query;
        self.matches = matches;
        true
    }

    /// Adopt a transcript produced against generation `generation`.
    pub fn adopt_transcript(&mut self, generation: u64, text: String) -> bool {
        if generation != self.generation {
            debug!(
                "discarding stale transcript (generation {} != {})",
                generation, self.generation
            );
            return false;
        }
        self.transcript = Some(text);
        true
    }

    /// Release everything and return to the empty state.
    pub fn clear(&mut self) {
        self.generation += 1;
        if let Some(original) = self.original.take() {
            self.urls.revoke(&original.source_url);
            if let Some(video_url) = &original.video_url {
                self.urls.revoke(video_url);
            }
        }
        self.release_derived();
    }

    /// Release every value derived from the current original.
    fn release_derived(&mut self) {
        if let Some(reconstruction) = self.reconstruction.take() {
            self.urls.revoke(&reconstruction.url);
        }
        self.query.clear();
        self.matches.clear();
        self.transcript = None;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize;
    use pretty_assertions::assert_eq;

    fn tone_buffer(secs: f64) -> AudioBuffer {
        let frames = (secs * 48000.0) as usize;
        let mut buffer = AudioBuffer::new(1, frames, 48000);
        for (i, s) in buffer.channel_mut(0).iter_mut().enumerate() {
            *s = 0.3 * (2.0 * std::f32::consts::PI * 330.0 * i as f32 / 48000.0).sin();
        }
        buffer
    }

    fn adopt_tone(session: &mut Session, name: &str) {
        let buffer = tone_buffer(2.0);
        let bytes = serialize::encode_wav(&buffer).unwrap();
        let source_url = session.urls_mut().alloc(bytes);
        session.adopt_original(MediaAsset {
            file_name: name.to_string(),
            buffer,
            source_url,
            video_url: None,
        });
    }

    #[test]
    fn test_adopt_original_replaces_and_releases() {
        let mut session = Session::new();
        adopt_tone(&mut session, "first.wav");
        let first_url = session.original().unwrap().source_url.clone();
        assert_eq!(session.urls().live_count(), 1);

        adopt_tone(&mut session, "second.wav");
        assert_eq!(session.original().unwrap().file_name, "second.wav");
        assert_eq!(session.urls().live_count(), 1);
        assert!(session.urls().resolve(&first_url).is_none());
    }

    #[test]
    fn test_reconstruction_adopted_and_replaced() {
        let mut session = Session::new();
        adopt_tone(&mut session, "clip.wav");
        let generation = session.generation();

        let processed = tone_buffer(2.0);
        let wav = serialize::encode_wav(&processed).unwrap();
        assert!(session.adopt_reconstruction(
            generation,
            processed,
            ReconstructionParams::default(),
            wav,
        ));
        let first_url = session.reconstruction().unwrap().url.clone();
        assert_eq!(session.urls().live_count(), 2);

        // A second reconstruction of the same original releases the first
        let processed = tone_buffer(2.0);
        let wav = serialize::encode_wav(&processed).unwrap();
        assert!(session.adopt_reconstruction(
            generation,
            processed,
            ReconstructionParams {
                phase_gain: 0.2,
                blend: 0.9,
            },
            wav,
        ));
        assert_eq!(session.urls().live_count(), 2);
        assert!(session.urls().resolve(&first_url).is_none());
    }

    #[test]
    fn test_stale_reconstruction_discarded() {
        let mut session = Session::new();
        adopt_tone(&mut session, "first.wav");
        let stale_generation = session.generation();

        // A new original arrives while the reconstruction is in flight
        adopt_tone(&mut session, "second.wav");

        let processed = tone_buffer(2.0);
        let wav = serialize::encode_wav(&processed).unwrap();
        assert!(!session.adopt_reconstruction(
            stale_generation,
            processed,
            ReconstructionParams::default(),
            wav,
        ));
        assert!(session.reconstruction().is_none());
        // The stale result allocated nothing
        assert_eq!(session.urls().live_count(), 1);
    }

    #[test]
    fn test_new_original_clears_derived_values() {
        let mut session = Session::new();
        adopt_tone(&mut session, "first.wav");
        let generation = session.generation();

        let processed = tone_buffer(2.0);
        let wav = serialize::encode_wav(&processed).unwrap();
        session.adopt_reconstruction(
            generation,
            processed,
            ReconstructionParams::default(),
            wav,
        );
        session.adopt_matches(
            generation,
            "whistle".to_string(),
            vec![SemanticMatch {
                start: 0.0,
                end: 0.5,
                score: 0.4,
            }],
        );
        session.adopt_transcript(generation, "hello".to_string());

        adopt_tone(&mut session, "second.wav");
        assert!(session.reconstruction().is_none());
        assert!(session.matches().is_empty());
        assert!(session.query().is_empty());
        assert!(session.transcript().is_none());
        assert_eq!(session.urls().live_count(), 1);
    }

    #[test]
    fn test_stale_matches_and_transcript_discarded() {
        let mut session = Session::new();
        adopt_tone(&mut session, "first.wav");
        let stale_generation = session.generation();
        adopt_tone(&mut session, "second.wav");

        assert!(!session.adopt_matches(stale_generation, "q".to_string(), Vec::new()));
        assert!(!session.adopt_transcript(stale_generation, "text".to_string()));
        assert!(session.transcript().is_none());
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut session = Session::new();
        adopt_tone(&mut session, "clip.wav");
        let generation = session.generation();
        let processed = tone_buffer(2.0);
        let wav = serialize::encode_wav(&processed).unwrap();
        session.adopt_reconstruction(
            generation,
            processed,
            ReconstructionParams::default(),
            wav,
        );

        session.clear();
        assert!(session.original().is_none());
        assert!(session.reconstruction().is_none());
        assert_eq!(session.urls().live_count(), 0);
        // Clearing orphans in-flight work too
        assert!(session.generation() > generation);
    }
}
