//! Capability traits for the transcription backend and blob store.
//!
//! These traits allow swapping implementations (real HTTP adapter vs mocks).
//! The mocks live here so every consumer tests against the same fakes.

use crate::error::{NotateError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Backend-reported status of one transcription job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Submitted,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states never change on subsequent polls.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Asynchronous speech-to-text backend.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Submit a transcription job referencing an already-uploaded artifact.
    ///
    /// Fire-and-forget: the backend may complete jobs in any order.
    async fn submit(
        &self,
        job_id: &str,
        language: &str,
        media_format: &str,
        media_uri: &str,
        output_bucket: &str,
    ) -> Result<()>;

    /// Query the current status of a job.
    async fn status(&self, job_id: &str) -> Result<JobStatus>;
}

/// Blob storage for chunk uploads and result artifacts.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `bucket`/`key`.
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Fetch the object at `bucket`/`key`.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}

/// Result artifact payload: `{ "results": { "transcripts": [ { "transcript": ... } ] } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptArtifact {
    pub results: TranscriptResults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptResults {
    pub transcripts: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptEntry {
    pub transcript: String,
}

impl TranscriptArtifact {
    /// Parse an artifact and extract the transcript text (first entry only).
    ///
    /// An empty transcripts array means the backend found no recognizable
    /// speech; that is a valid empty transcript, not a parse error.
    pub fn parse_text(job_id: &str, bytes: &[u8]) -> Result<String> {
        let artifact: TranscriptArtifact =
            serde_json::from_slice(bytes).map_err(|e| NotateError::ResultParse {
                job_id: job_id.to_string(),
                message: e.to_string(),
            })?;
        Ok(artifact
            .results
            .transcripts
            .first()
            .map(|t| t.transcript.clone())
            .unwrap_or_default())
    }
}

/// Scripted status sequence for one mock job.
#[derive(Debug, Clone)]
struct JobScript {
    statuses: Vec<JobStatus>,
    polls: usize,
}

/// Mock backend for testing the orchestrator without a network.
///
/// Each job id is scripted with a sequence of statuses returned on successive
/// polls; the last status repeats once the script runs out. Unscripted jobs
/// report `Completed` immediately.
#[derive(Debug, Default)]
pub struct MockBackend {
    scripts: Mutex<HashMap<String, JobScript>>,
    submitted: Mutex<Vec<String>>,
    status_calls: AtomicU32,
    transport_down: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the statuses a job reports on successive polls.
    pub fn script(self, job_id: &str, statuses: &[JobStatus]) -> Self {
        self.scripts.lock().unwrap().insert(
            job_id.to_string(),
            JobScript {
                statuses: statuses.to_vec(),
                polls: 0,
            },
        );
        self
    }

    /// Make every status query fail with a transport error.
    pub fn with_transport_down(mut self) -> Self {
        self.transport_down = true;
        self
    }

    /// Job ids submitted so far, in submission order.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    /// Total number of status queries observed.
    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionBackend for MockBackend {
    async fn submit(
        &self,
        job_id: &str,
        _language: &str,
        _media_format: &str,
        _media_uri: &str,
        _output_bucket: &str,
    ) -> Result<()> {
        self.submitted.lock().unwrap().push(job_id.to_string());
        Ok(())
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.transport_down {
            return Err(NotateError::Transport {
                message: "mock transport down".to_string(),
            });
        }

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(job_id) {
            Some(script) => {
                let status = script
                    .statuses
                    .get(script.polls)
                    .or(script.statuses.last())
                    .copied()
                    .unwrap_or(JobStatus::Completed);
                script.polls += 1;
                Ok(status)
            }
            None => Ok(JobStatus::Completed),
        }
    }
}

/// In-memory blob store for tests, with injectable put failures.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    failing_puts: AtomicU32,
    failing_gets: AtomicU32,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` put calls with a transport error.
    pub fn fail_next_puts(&self, n: u32) {
        self.failing_puts.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` get calls with a transport error.
    pub fn fail_next_gets(&self, n: u32) {
        self.failing_gets.store(n, Ordering::SeqCst);
    }

    /// Pre-populate an object (e.g. a result artifact).
    pub fn insert(&self, bucket: &str, key: &str, bytes: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), bytes);
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        let remaining = self.failing_puts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_puts.store(remaining - 1, Ordering::SeqCst);
            return Err(NotateError::Transport {
                message: "mock put failure".to_string(),
            });
        }
        self.insert(bucket, key, bytes);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let remaining = self.failing_gets.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_gets.store(remaining - 1, Ordering::SeqCst);
            return Err(NotateError::Transport {
                message: "mock get failure".to_string(),
            });
        }
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| NotateError::Transport {
                message: format!("no object at {bucket}/{key}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Submitted.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_job_status_serde_screaming_snake() {
        let json = serde_json::to_string(&JobStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
        let status: JobStatus = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(status, JobStatus::Running);
    }

    #[test]
    fn test_artifact_parse_text() {
        let payload = br#"{"results":{"transcripts":[{"transcript":"hello world"}]}}"#;
        let text = TranscriptArtifact::parse_text("j", payload).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_artifact_first_transcript_only() {
        let payload =
            br#"{"results":{"transcripts":[{"transcript":"first"},{"transcript":"second"}]}}"#;
        let text = TranscriptArtifact::parse_text("j", payload).unwrap();
        assert_eq!(text, "first");
    }

    #[test]
    fn test_artifact_empty_transcripts_is_empty_text() {
        let payload = br#"{"results":{"transcripts":[]}}"#;
        let text = TranscriptArtifact::parse_text("j", payload).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_artifact_malformed_is_parse_error() {
        let result = TranscriptArtifact::parse_text("abc-00001", b"{\"nope\":true}");
        match result {
            Err(NotateError::ResultParse { job_id, .. }) => assert_eq!(job_id, "abc-00001"),
            other => panic!("expected ResultParse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mock_backend_scripted_statuses() {
        let backend = MockBackend::new().script(
            "j1",
            &[JobStatus::Submitted, JobStatus::Running, JobStatus::Completed],
        );

        assert_eq!(backend.status("j1").await.unwrap(), JobStatus::Submitted);
        assert_eq!(backend.status("j1").await.unwrap(), JobStatus::Running);
        assert_eq!(backend.status("j1").await.unwrap(), JobStatus::Completed);
        // Last status repeats
        assert_eq!(backend.status("j1").await.unwrap(), JobStatus::Completed);
        assert_eq!(backend.status_calls(), 4);
    }

    #[tokio::test]
    async fn test_mock_backend_transport_down() {
        let backend = MockBackend::new().with_transport_down();
        let result = backend.status("j1").await;
        assert!(matches!(result, Err(NotateError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_mock_backend_records_submissions() {
        let backend = MockBackend::new();
        backend
            .submit("a-00000", "en-US", "wav", "mem://i/a/00000.wav", "out")
            .await
            .unwrap();
        backend
            .submit("a-00001", "en-US", "wav", "mem://i/a/00001.wav", "out")
            .await
            .unwrap();
        assert_eq!(backend.submitted(), vec!["a-00000", "a-00001"]);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryBlobStore::new();
        store.put("b", "k", vec![1, 2, 3]).await.unwrap();
        assert_eq!(store.get("b", "k").await.unwrap(), vec![1, 2, 3]);
        assert!(store.get("b", "missing").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_fail_next_puts() {
        let store = MemoryBlobStore::new();
        store.fail_next_puts(2);
        assert!(store.put("b", "k", vec![]).await.is_err());
        assert!(store.put("b", "k", vec![]).await.is_err());
        assert!(store.put("b", "k", vec![]).await.is_ok());
    }
}
