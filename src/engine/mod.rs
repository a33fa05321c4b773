//! Core audio engine types

pub mod buffer;

pub use buffer::AudioBuffer;
