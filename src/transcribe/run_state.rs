//! Per-run job bookkeeping: outstanding set, completed map, failed set.
//!
//! The poll loop never mutates a collection it is iterating. Each cycle takes
//! a snapshot of the outstanding jobs, queries them, and applies the whole
//! batch of observations in one step ([`RunState::apply`]), so the transition
//! is testable without a network or a clock.

use crate::defaults;
use crate::transcribe::backend::JobStatus;
use std::collections::{BTreeMap, BTreeSet};

/// Derive the deterministic job id for a sequence index.
///
/// Zero-padding keeps lexical ordering of job ids identical to sequence
/// order; the sequence index itself remains the source of truth.
pub fn job_id(run_id: &str, seq: u32) -> String {
    format!("{run_id}-{seq:0width$}", width = defaults::SEQ_PAD)
}

/// Object key under which a chunk's audio is uploaded.
pub fn upload_key(run_id: &str, seq: u32) -> String {
    format!(
        "{run_id}/{seq:0width$}.{}",
        defaults::MEDIA_FORMAT,
        width = defaults::SEQ_PAD
    )
}

/// Object key of a completed job's result artifact.
pub fn artifact_key(job_id: &str) -> String {
    format!("{job_id}.json")
}

/// One submitted transcription job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionJob {
    pub seq: u32,
    pub job_id: String,
    pub status: JobStatus,
}

/// Transcript for one sequence index (possibly empty text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptResult {
    pub seq: u32,
    pub text: String,
}

/// What one poll of one job observed.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Job completed and its transcript was fetched and parsed.
    Completed(String),
    /// Job is still SUBMITTED or RUNNING; retry next cycle.
    Pending(JobStatus),
    /// Job permanently failed (backend FAILED, or unparseable artifact).
    Failed(String),
    /// Transport-level error; the job stays outstanding.
    Transport(String),
}

/// Observation for one job in one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PollObservation {
    pub seq: u32,
    pub outcome: PollOutcome,
}

/// Counts from one applied poll cycle, for progress logging and the
/// backend-unavailability bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleSummary {
    pub polled: usize,
    pub completed: usize,
    pub failed: usize,
    pub transport_errors: usize,
}

impl CycleSummary {
    /// True when every poll in the cycle hit a transport error — the signal
    /// for total backend unavailability.
    pub fn all_transport_errors(&self) -> bool {
        self.polled > 0 && self.transport_errors == self.polled
    }
}

/// Exclusive per-run state; owned by the orchestrator's single control flow.
#[derive(Debug, Default)]
pub struct RunState {
    outstanding: BTreeMap<u32, TranscriptionJob>,
    results: BTreeMap<u32, TranscriptResult>,
    failed: BTreeSet<u32>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly submitted job as outstanding.
    pub fn record_submitted(&mut self, job: TranscriptionJob) {
        self.outstanding.insert(job.seq, job);
    }

    /// Snapshot of the outstanding jobs for one poll cycle.
    ///
    /// Polling works off this snapshot, so each job is queried exactly once
    /// per cycle and the live set is never mutated mid-iteration.
    pub fn snapshot(&self) -> Vec<TranscriptionJob> {
        self.outstanding.values().cloned().collect()
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_done(&self) -> bool {
        self.outstanding.is_empty()
    }

    pub fn results(&self) -> &BTreeMap<u32, TranscriptResult> {
        &self.results
    }

    pub fn failed(&self) -> &BTreeSet<u32> {
        &self.failed
    }

    /// Consume the state, yielding the result map and failed set.
    pub fn into_parts(self) -> (BTreeMap<u32, TranscriptResult>, BTreeSet<u32>) {
        (self.results, self.failed)
    }

    /// Apply one cycle's observations: the pure state transition.
    ///
    /// Removal from outstanding and insertion into results happen together
    /// per job, so a completed job can never be polled again.
    pub fn apply(&mut self, observations: Vec<PollObservation>) -> CycleSummary {
        let mut summary = CycleSummary {
            polled: observations.len(),
            ..Default::default()
        };

        for obs in observations {
            match obs.outcome {
                PollOutcome::Completed(text) => {
                    if self.outstanding.remove(&obs.seq).is_some() {
                        self.results
                            .insert(obs.seq, TranscriptResult { seq: obs.seq, text });
                        summary.completed += 1;
                    }
                }
                PollOutcome::Failed(_) => {
                    if self.outstanding.remove(&obs.seq).is_some() {
                        self.failed.insert(obs.seq);
                        summary.failed += 1;
                    }
                }
                PollOutcome::Pending(status) => {
                    if let Some(job) = self.outstanding.get_mut(&obs.seq) {
                        job.status = status;
                    }
                }
                PollOutcome::Transport(_) => {
                    summary.transport_errors += 1;
                }
            }
        }

        summary
    }
}
