//! speakerkeep: a streaming audio annotation service that wraps a
//! transcription backend and a speaker diarization backend, adding
//! cross-chunk speaker identity continuity.
//!
//! # Architecture
//!
//! ```text
//!                     ┌───────────────────────────┐
//!                     │        HTTP server        │
//!                     │  /inference  /transcribe   │
//!                     │  /session/{id}/speakers    │
//!                     └─────────────┬─────────────┘
//!                                   │
//!                                   ▼
//!                     ┌───────────────────────────┐
//!                     │       Orchestrator         │
//!                     └─────────────┬─────────────┘
//!              ┌────────────────────┼────────────────────┐
//!              ▼                    ▼                    ▼
//!       ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//!       │ Transcriber │     │  Transcoder  │     │   Diarizer   │
//!       │   (HTTP)    │     │   (ffmpeg)   │     │ (subprocess) │
//!       └─────────────┘     └──────────────┘     └──────┬───────┘
//!                                                        │ turns
//!                                                        ▼
//!                                                ┌──────────────┐
//!                                                │   Resolver   │──▶ Embedder (HTTP)
//!                                                └──────┬───────┘
//!                                                        │ stable speaker ids
//!                                                        ▼
//!                                                ┌──────────────┐
//!                                                │    Merger    │
//!                                                └──────────────┘
//! ```
//!
//! Each collaborator is reached over a process boundary and abstracted
//! behind a narrow trait in [`collaborators`], so the core pipeline never
//! depends on a specific transcription or diarization implementation.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod merger;
pub mod orchestrator;
pub mod resolver;
pub mod server;
pub mod session;
pub mod speaker;

pub use config::Config;
pub use error::{CollaboratorError, ServiceError};
pub use orchestrator::Orchestrator;
