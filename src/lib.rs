//! notate - Silence-segmented batch transcription for long recordings
//!
//! Splits a recording into utterance-level chunks at an adaptively chosen
//! silence threshold, submits one asynchronous transcription job per chunk,
//! polls the jobs to completion, and reassembles transcripts in recording
//! order.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod assemble;
pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod segment;
pub mod transcribe;

// Core traits (decode → segment → transcribe → assemble)
pub use audio::decoder::{Decoder, SymphoniaDecoder};
pub use audio::splitter::{FrameSplitter, SilenceSplitter};
pub use audio::waveform::Waveform;
pub use segment::{AudioSegmenter, Chunk, SegmenterConfig};
pub use transcribe::backend::{BlobStore, JobStatus, TranscriptionBackend};

// Orchestration
pub use transcribe::orchestrator::{AbortReason, Orchestrator, OrchestratorConfig, RunOutcome};
pub use transcribe::run_state::{RunState, TranscriptResult};

// Error handling
pub use error::{NotateError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
