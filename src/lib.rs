//! Sonaris - Forensic Audio Reconstruction and Semantic Search
//!
//! Sonaris turns a noisy mobile recording into three synchronized views:
//! 1. Reconstruction - a parameterized enhancement of the decoded signal
//! 2. Semantic search - ranked time windows matching a text query
//! 3. Dual transport - two time-locked playback surfaces with a loop region
//!
//! # Architecture
//!
//! Data flows leaves-first: the media normalizer decodes arbitrary input
//! into a canonical PCM buffer (delegating video extraction to an external
//! transcoder with a direct-decode fallback), the reconstruction engine and
//! semantic matcher derive new values from that buffer, and the transport
//! coordinator keeps two playback surfaces sample-locked over one loop
//! region. All live values are owned by a single [`session::Session`]
//! record with replace-and-release semantics for playable URLs.

pub mod cli;
pub mod engine;
pub mod error;
pub mod media;
pub mod reconstruct;
pub mod semantic;
pub mod serialize;
pub mod session;
pub mod stt;
pub mod transport;

pub use error::{Result, SonarisError};
