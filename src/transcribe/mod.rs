//! Asynchronous transcription: capability traits, per-run state, and the
//! submit-then-poll orchestrator.

pub mod backend;
pub mod http;
pub mod orchestrator;
pub mod run_state;

pub use backend::{BlobStore, JobStatus, TranscriptionBackend};
pub use http::{HttpBackend, HttpBlobStore};
pub use orchestrator::{AbortReason, Orchestrator, OrchestratorConfig, RunOutcome};
pub use run_state::{RunState, TranscriptResult, TranscriptionJob, job_id};
