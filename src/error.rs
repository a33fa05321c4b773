//! Error handling for Sonaris
//!
//! The taxonomy mirrors the recovery policy of the pipeline: decode and
//! engine failures surface to the caller with their underlying cause,
//! transcode failures are recovered locally by the normalizer's fallback
//! path, and scorer failures are absorbed by the semantic matcher.

use thiserror::Error;

/// Result type alias for Sonaris operations
pub type Result<T> = std::result::Result<T, SonarisError>;

/// Main error type for Sonaris operations
#[derive(Error, Debug)]
pub enum SonarisError {
    /// Input unreadable by every decoding path. Fatal to that load;
    /// previous session state is left untouched.
    #[error("Unable to decode media: {reason}")]
    Decode {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reconstruction processing assets failed to initialize. The previous
    /// processed asset is retained.
    #[error("Reconstruction engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    /// The embedding backend could not be initialized or threw during
    /// inference. Never user-fatal: the matcher substitutes the
    /// deterministic fallback and proceeds.
    #[error("Embedding scorer unavailable: {reason}")]
    ScorerUnavailable { reason: String },

    /// The external transcoding tool failed. Internal: recovered by falling
    /// back to direct decode, surfaced only if that also fails.
    #[error("Transcode failed: {reason}")]
    Transcode { reason: String },

    /// Malformed buffer or parameter input to a processing stage.
    #[error("Invalid audio: {reason}")]
    InvalidAudio { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SonarisError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SonarisError::Decode { .. } => "DECODE_ERROR",
            SonarisError::EngineUnavailable { .. } => "ENGINE_UNAVAILABLE",
            SonarisError::ScorerUnavailable { .. } => "SCORER_UNAVAILABLE",
            SonarisError::Transcode { .. } => "TRANSCODE_FAILURE",
            SonarisError::InvalidAudio { .. } => "INVALID_AUDIO",
            SonarisError::Io(_) => "IO_ERROR",
            SonarisError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the operation that produced this error can be retried
    /// without any state cleanup.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SonarisError::Decode { .. }
                | SonarisError::EngineUnavailable { .. }
                | SonarisError::ScorerUnavailable { .. }
                | SonarisError::Transcode { .. }
        )
    }

    /// Get a user-facing message for this error. The underlying cause is
    /// kept on the `source` chain for diagnostics.
    pub fn user_message(&self) -> String {
        match self {
            SonarisError::Decode { .. } => {
                "Unable to decode file. Try WAV, M4A, or MP4 recorded on device.".to_string()
            }
            SonarisError::EngineUnavailable { reason } => {
                format!("Reconstruction is unavailable right now: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}
