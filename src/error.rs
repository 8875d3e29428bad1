//! Error types for speakerkeep
//!
//! Uses thiserror for ergonomic error definitions, mirroring the layered
//! error design of the service this core wraps: each subsystem gets its own
//! enum, and a top-level enum composes them with `#[from]`.

use thiserror::Error;

/// Top-level error type for request handling
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Collaborator unavailable: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Audio could not be processed: {0}")]
    CorruptInput(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Client error: {0}")]
    ClientError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the Transcriber, Diarizer, Embedder, and Transcoder
/// collaborators. Transport failures, malformed responses, and non-2xx
/// status codes all collapse into a small set of variants since the
/// orchestrator only needs to know "did it work" to decide whether to
/// degrade gracefully.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("{collaborator} is unavailable: {message}")]
    Unavailable {
        collaborator: &'static str,
        message: String,
    },

    #[error("{collaborator} returned a malformed response: {message}")]
    Malformed {
        collaborator: &'static str,
        message: String,
    },

    #[error("{collaborator} request timed out")]
    Timeout { collaborator: &'static str },
}

/// Result type alias using ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;
