//! Error types for the persona registry.
//!
//! All errors are strongly typed and propagated without panicking.
//! Secrets are never included in error messages.

use std::path::PathBuf;

/// Registry error types covering all index and manager operations.
///
/// `CorruptIndex` is deliberately distinct from "file absent": a missing
/// index file yields an empty registry, while a present-but-malformed file
/// is a fatal load error and must never be silently reset.
#[derive(Debug, thiserror::Error)]
pub enum PersonaError {
    #[error("No such persona: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Corrupt personas index at {path}: {message}")]
    CorruptIndex { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, PersonaError>;
