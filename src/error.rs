//! # Error Types
//!
//! Custom error types for the Efergy codec using `thiserror`.

use thiserror::Error;

/// Main error type for the Efergy codec
#[derive(Debug, Error)]
pub enum CodecError {
    /// Exponent field outside the range the current formula supports (0-15)
    #[error("Exponent {0} outside supported range 0..=15")]
    ExponentOutOfRange(u8),

    /// Bit string could not be parsed into a frame
    #[error("Invalid bit string: {0}")]
    InvalidBitString(String),

    /// Derived waveform timing would not be recognised by the receiver
    #[error("Waveform timing error: {0}")]
    Timing(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading serialization errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the Efergy codec
pub type Result<T> = std::result::Result<T, CodecError>;
