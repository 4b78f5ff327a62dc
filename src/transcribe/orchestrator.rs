//! Job orchestration: submit one transcription job per chunk, poll all
//! outstanding jobs to completion, tolerate partial failure.
//!
//! Submission is sequential (each call is a fast independent network call);
//! within a poll cycle all status queries run concurrently and the cycle's
//! observations are applied to [`RunState`] in one step. The sleep between
//! cycles is the cancellation point: an interrupted run returns every result
//! gathered so far.

use crate::defaults;
use crate::error::{NotateError, Result};
use crate::segment::Chunk;
use crate::transcribe::backend::{BlobStore, JobStatus, TranscriptArtifact, TranscriptionBackend};
use crate::transcribe::run_state::{
    PollObservation, PollOutcome, RunState, TranscriptResult, TranscriptionJob, artifact_key,
    job_id, upload_key,
};
use futures_util::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Configuration for one orchestrator run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Language code sent with each job.
    pub language: String,
    /// Media format of uploaded chunks.
    pub media_format: String,
    /// Bucket chunk audio is uploaded to.
    pub input_bucket: String,
    /// Bucket the backend writes result artifacts to.
    pub output_bucket: String,
    /// Sleep between poll cycles.
    pub poll_interval: Duration,
    /// Upload/submission attempts per chunk before aborting the run.
    pub submit_attempts: u32,
    /// Consecutive all-transport-error cycles before aborting.
    pub max_poll_failures: u32,
    /// Suppress progress output.
    pub quiet: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            media_format: defaults::MEDIA_FORMAT.to_string(),
            input_bucket: String::new(),
            output_bucket: String::new(),
            poll_interval: Duration::from_secs(defaults::POLL_INTERVAL_SECS),
            submit_attempts: defaults::SUBMIT_ATTEMPTS,
            max_poll_failures: defaults::MAX_POLL_FAILURES,
            quiet: true,
        }
    }
}

/// Why a run stopped before resolving every job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// User interrupt observed at the cycle boundary.
    Cancelled,
    /// Too many consecutive poll cycles failed entirely.
    BackendUnavailable { cycles: u32 },
}

/// Final state of a run. `abort` is `None` when every job resolved
/// (completions and permanent failures both count as resolved).
#[derive(Debug)]
pub struct RunOutcome {
    pub results: BTreeMap<u32, TranscriptResult>,
    pub failed: BTreeSet<u32>,
    pub abort: Option<AbortReason>,
}

impl RunOutcome {
    pub fn is_resolved(&self) -> bool {
        self.abort.is_none()
    }
}

/// Drives one transcription run end to end.
pub struct Orchestrator {
    config: OrchestratorConfig,
    backend: Arc<dyn TranscriptionBackend>,
    store: Arc<dyn BlobStore>,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        backend: Arc<dyn TranscriptionBackend>,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            config,
            backend,
            store,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked at each cycle boundary; set it to abort the run while
    /// keeping results gathered so far.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run the full submit-then-poll state machine for one chunk sequence.
    ///
    /// Decode has already happened; upload or submission retry exhaustion is
    /// an `Err`. Everything after submission resolves into the outcome:
    /// job failures land in `failed`, cancellation and backend unavailability
    /// set `abort` with partial results intact.
    pub async fn run(&self, chunks: &[Chunk], run_id: &str) -> Result<RunOutcome> {
        let mut state = RunState::new();

        for chunk in chunks {
            let job = self.submit_chunk(chunk, run_id).await?;
            state.record_submitted(job);
        }

        if !self.config.quiet {
            eprintln!(
                "notate: submitted {} job(s) for run {run_id}",
                state.outstanding_count()
            );
        }

        // Poll until no job is outstanding; this is the sole termination
        // condition. Zero submitted jobs means no sleep and no polls.
        let mut consecutive_failures: u32 = 0;
        while !state.is_done() {
            if self.cancel.load(Ordering::SeqCst) {
                return Ok(self.outcome(state, Some(AbortReason::Cancelled)));
            }

            tokio::time::sleep(self.config.poll_interval).await;

            if self.cancel.load(Ordering::SeqCst) {
                return Ok(self.outcome(state, Some(AbortReason::Cancelled)));
            }

            let snapshot = state.snapshot();
            let observations = self.poll_cycle(&snapshot).await;
            let summary = state.apply(observations);

            if summary.all_transport_errors() {
                consecutive_failures += 1;
                if consecutive_failures >= self.config.max_poll_failures {
                    return Ok(self.outcome(
                        state,
                        Some(AbortReason::BackendUnavailable {
                            cycles: consecutive_failures,
                        }),
                    ));
                }
            } else {
                consecutive_failures = 0;
            }

            if !self.config.quiet {
                eprintln!(
                    "notate: {} done, {} failed, {} still waiting",
                    state.results().len(),
                    state.failed().len(),
                    state.outstanding_count()
                );
            }
        }

        Ok(self.outcome(state, None))
    }

    fn outcome(&self, state: RunState, abort: Option<AbortReason>) -> RunOutcome {
        let (results, failed) = state.into_parts();
        RunOutcome {
            results,
            failed,
            abort,
        }
    }

    /// Upload one chunk's audio and submit its job, retrying each step a
    /// bounded number of times. Exhaustion aborts the run — a chunk is never
    /// silently dropped.
    async fn submit_chunk(&self, chunk: &Chunk, run_id: &str) -> Result<TranscriptionJob> {
        let seq = chunk.index();
        let id = job_id(run_id, seq);
        let key = upload_key(run_id, seq);
        let bytes = chunk.wav_bytes()?;

        let mut last_err = String::new();
        let mut uploaded = false;
        for _ in 0..self.config.submit_attempts {
            match self
                .store
                .put(&self.config.input_bucket, &key, bytes.clone())
                .await
            {
                Ok(()) => {
                    uploaded = true;
                    break;
                }
                Err(e) => last_err = e.to_string(),
            }
        }
        if !uploaded {
            return Err(NotateError::Upload {
                key,
                attempts: self.config.submit_attempts,
                message: last_err,
            });
        }

        let media_uri = format!("blob://{}/{}", self.config.input_bucket, key);
        let mut submitted = false;
        for _ in 0..self.config.submit_attempts {
            match self
                .backend
                .submit(
                    &id,
                    &self.config.language,
                    &self.config.media_format,
                    &media_uri,
                    &self.config.output_bucket,
                )
                .await
            {
                Ok(()) => {
                    submitted = true;
                    break;
                }
                Err(e) => last_err = e.to_string(),
            }
        }
        if !submitted {
            return Err(NotateError::Submission {
                job_id: id,
                attempts: self.config.submit_attempts,
                message: last_err,
            });
        }

        Ok(TranscriptionJob {
            seq,
            job_id: id,
            status: JobStatus::Submitted,
        })
    }

    /// Poll every job in the snapshot concurrently and collect observations.
    ///
    /// Status queries and result fetches are independent reads, so they run
    /// in parallel; the cycle waits for all of them before returning, keeping
    /// each RunState mutation within a single cycle's observations.
    async fn poll_cycle(&self, snapshot: &[TranscriptionJob]) -> Vec<PollObservation> {
        let polls = snapshot.iter().map(|job| self.poll_job(job));
        join_all(polls).await
    }

    async fn poll_job(&self, job: &TranscriptionJob) -> PollObservation {
        let outcome = match self.backend.status(&job.job_id).await {
            Ok(JobStatus::Completed) => self.fetch_result(&job.job_id).await,
            Ok(JobStatus::Failed) => {
                let err = NotateError::JobFailed {
                    job_id: job.job_id.clone(),
                    reason: "backend reported FAILED".to_string(),
                };
                PollOutcome::Failed(err.to_string())
            }
            Ok(status) => PollOutcome::Pending(status),
            Err(e) => PollOutcome::Transport(e.to_string()),
        };

        if !self.config.quiet {
            match &outcome {
                PollOutcome::Completed(_) => eprintln!("notate: job {} is done", job.job_id),
                PollOutcome::Failed(reason) => {
                    eprintln!("notate: job {} failed: {reason}", job.job_id)
                }
                _ => {}
            }
        }

        PollObservation {
            seq: job.seq,
            outcome,
        }
    }

    /// Fetch and parse a completed job's artifact.
    ///
    /// A transport error leaves the job outstanding for the next cycle; an
    /// unparseable artifact is permanent, equivalent to a failed job.
    async fn fetch_result(&self, job_id: &str) -> PollOutcome {
        let key = artifact_key(job_id);
        let bytes = match self.store.get(&self.config.output_bucket, &key).await {
            Ok(bytes) => bytes,
            Err(e) => return PollOutcome::Transport(e.to_string()),
        };

        match TranscriptArtifact::parse_text(job_id, &bytes) {
            Ok(text) => PollOutcome::Completed(text),
            Err(e) => PollOutcome::Failed(e.to_string()),
        }
    }
}
