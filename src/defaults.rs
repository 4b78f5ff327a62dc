//! Default configuration constants for notate.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default minimum silence duration in milliseconds for chunk splitting.
///
/// A pause must last at least this long to count as an utterance boundary.
/// 2000ms keeps sentences with natural mid-sentence pauses in one chunk.
pub const MIN_SILENCE_MS: u32 = 2000;

/// Candidate threshold offsets (dBFS) relative to the recording's average loudness.
///
/// The segmenter tries each offset in order and keeps the one that yields the
/// most chunks. Evaluated closest-to-zero first so that ties prefer the least
/// aggressive threshold.
pub const CANDIDATE_OFFSETS: [f32; 3] = [-0.5, -1.0, -1.5];

/// Frame duration in milliseconds used for silence classification.
pub const FRAME_MS: u32 = 10;

/// Default seconds to sleep between poll cycles.
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Consecutive all-transport-error poll cycles before the run aborts.
pub const MAX_POLL_FAILURES: u32 = 10;

/// Upload and submission attempts per chunk before aborting the run.
pub const SUBMIT_ATTEMPTS: u32 = 3;

/// Zero-padding width for sequence indices in job ids and object keys.
///
/// Five digits keep lexical ordering of job ids identical to sequence order
/// for any realistic chunk count.
pub const SEQ_PAD: usize = 5;

/// Default language code sent with each transcription job.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Media format of uploaded chunk artifacts.
///
/// Chunks are re-encoded as 16-bit PCM WAV regardless of the input container.
pub const MEDIA_FORMAT: &str = "wav";

/// Default backend endpoint for the HTTP reference adapter.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8700";
