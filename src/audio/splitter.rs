//! Silence-based splitting of a waveform into speech spans.
//!
//! The splitter is a pure function of its inputs: the same waveform, minimum
//! silence duration, and threshold always produce the same spans. Loudness is
//! classified per fixed-size frame; a run of silent frames at least
//! `min_silence_ms` long is an utterance boundary.

use crate::audio::waveform::{Waveform, dbfs_of};
use crate::defaults;
use std::ops::Range;

/// Trait for splitting a waveform on silence.
///
/// Implementations must be deterministic; the segmenter relies on re-running
/// the split at several candidate thresholds and comparing the results.
pub trait SilenceSplitter: Send + Sync {
    /// Split `waveform` into ordered, non-overlapping speech spans.
    ///
    /// A span is a sample range containing speech, bounded by silence runs of
    /// at least `min_silence_ms` (or the ends of the recording). Returns an
    /// empty vec when the whole recording is below `threshold_dbfs`.
    fn split(
        &self,
        waveform: &Waveform,
        min_silence_ms: u32,
        threshold_dbfs: f32,
    ) -> Vec<Range<usize>>;
}

/// Frame-based splitter: classifies fixed 10ms frames by loudness.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSplitter;

impl FrameSplitter {
    pub fn new() -> Self {
        Self
    }
}

impl SilenceSplitter for FrameSplitter {
    fn split(
        &self,
        waveform: &Waveform,
        min_silence_ms: u32,
        threshold_dbfs: f32,
    ) -> Vec<Range<usize>> {
        let samples = waveform.samples();
        if samples.is_empty() || waveform.sample_rate() == 0 {
            return Vec::new();
        }

        let frame_len =
            ((waveform.sample_rate() as u64 * defaults::FRAME_MS as u64) / 1000).max(1) as usize;
        let min_silence_frames =
            (min_silence_ms as usize).div_ceil(defaults::FRAME_MS as usize).max(1);

        // Classify every frame (the trailing partial frame counts too).
        let silent: Vec<bool> = samples
            .chunks(frame_len)
            .map(|frame| dbfs_of(frame) < threshold_dbfs)
            .collect();

        // Walk frame runs; silence runs of at least min_silence_frames split
        // the signal, shorter ones stay inside the surrounding speech span.
        let mut spans: Vec<Range<usize>> = Vec::new();
        let mut span_start: Option<usize> = None;
        let mut silence_run = 0usize;

        for (i, &is_silent) in silent.iter().enumerate() {
            if is_silent {
                silence_run += 1;
                if silence_run == min_silence_frames
                    && let Some(start) = span_start.take()
                {
                    // The span ends where this qualifying silence run began.
                    let end_frame = i + 1 - silence_run;
                    spans.push(frame_range(start, end_frame, frame_len, samples.len()));
                }
            } else {
                if span_start.is_none() {
                    span_start = Some(i);
                }
                silence_run = 0;
            }
        }

        if let Some(start) = span_start {
            let end_frame = silent.len() - silence_run;
            spans.push(frame_range(start, end_frame, frame_len, samples.len()));
        }

        spans
    }
}

/// Convert a frame range to a clamped sample range.
fn frame_range(
    start_frame: usize,
    end_frame: usize,
    frame_len: usize,
    total: usize,
) -> Range<usize> {
    let start = (start_frame * frame_len).min(total);
    let end = (end_frame * frame_len).min(total);
    start..end
}
