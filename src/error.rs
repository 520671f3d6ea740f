//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(
        "File too large ({size} bytes, max {limit} bytes). Please try a shorter clip or smaller image."
    )]
    OversizedMedia { size: u64, limit: u64 },

    #[error("Could not read media: {0}")]
    MediaRead(String),

    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Poster lookup failed: {0}")]
    PosterLookup(String),

    #[error("Voice input unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
