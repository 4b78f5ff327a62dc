//! Adaptive threshold search for utterance segmentation.
//!
//! A single fixed silence threshold under- or over-splits depending on how
//! loud the recording is. Instead of a tuned parameter, the segmenter tries a
//! small set of thresholds relative to the recording's own average loudness
//! and keeps whichever yields the most chunks — the proxy for "most
//! utterances correctly isolated".

use crate::audio::splitter::SilenceSplitter;
use crate::audio::waveform::Waveform;
use crate::defaults;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::ops::Range;

/// Configuration for the segmenter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Minimum silence duration (ms) that counts as an utterance boundary.
    pub min_silence_ms: u32,
    /// Threshold offsets (dBFS) relative to average loudness, tried in order.
    pub candidate_offsets: Vec<f32>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_silence_ms: defaults::MIN_SILENCE_MS,
            candidate_offsets: defaults::CANDIDATE_OFFSETS.to_vec(),
        }
    }
}

/// One contiguous utterance-level slice of the recording.
///
/// Immutable after creation; `index` is the chunk's 0-based position in the
/// original recording and is the single source of truth for ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    index: u32,
    samples: Vec<i16>,
    sample_rate: u32,
}

impl Chunk {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Encode the chunk as 16-bit PCM mono WAV for upload.
    pub fn wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| crate::error::NotateError::Other(e.to_string()))?;
            for &s in &self.samples {
                writer
                    .write_sample(s)
                    .map_err(|e| crate::error::NotateError::Other(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| crate::error::NotateError::Other(e.to_string()))?;
        }
        Ok(cursor.into_inner())
    }
}

/// The winning silence profile: the threshold that produced the most chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct SilenceProfile {
    /// Selected threshold in dBFS.
    pub threshold_dbfs: f32,
    /// Offset relative to average loudness that produced it.
    pub offset: f32,
    /// Chunk boundaries at that threshold.
    pub spans: Vec<Range<usize>>,
}

/// Splits a waveform into ordered chunks via the candidate-threshold search.
pub struct AudioSegmenter<S: SilenceSplitter> {
    config: SegmenterConfig,
    splitter: S,
}

impl<S: SilenceSplitter> AudioSegmenter<S> {
    pub fn new(config: SegmenterConfig, splitter: S) -> Self {
        Self { config, splitter }
    }

    /// Search the candidate thresholds and return the winning profile.
    ///
    /// Candidates are evaluated in configured order; only a strictly greater
    /// chunk count replaces the current best, so ties keep the earlier
    /// (closest-to-zero) offset.
    pub fn search(&self, waveform: &Waveform) -> SilenceProfile {
        let avg = waveform.dbfs();

        let mut best: Option<SilenceProfile> = None;
        for &offset in &self.config.candidate_offsets {
            let threshold = avg + offset;
            let spans = self
                .splitter
                .split(waveform, self.config.min_silence_ms, threshold);

            let improved = match &best {
                None => true,
                Some(prev) => spans.len() > prev.spans.len(),
            };
            if improved {
                best = Some(SilenceProfile {
                    threshold_dbfs: threshold,
                    offset,
                    spans,
                });
            }
        }

        best.unwrap_or(SilenceProfile {
            threshold_dbfs: avg,
            offset: 0.0,
            spans: Vec::new(),
        })
    }

    /// Segment the waveform into ordered chunks.
    ///
    /// If every candidate yields zero chunks, the whole recording becomes one
    /// full-length chunk rather than an error.
    pub fn segment(&self, waveform: &Waveform) -> Vec<Chunk> {
        let profile = self.search(waveform);

        let spans = if profile.spans.is_empty() {
            vec![0..waveform.len()]
        } else {
            profile.spans
        };

        spans
            .into_iter()
            .enumerate()
            .map(|(i, span)| Chunk {
                index: i as u32,
                samples: waveform.samples()[span].to_vec(),
                sample_rate: waveform.sample_rate(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Splitter stub that returns a scripted number of spans per threshold
    /// and records the thresholds it was called with.
    struct ScriptedSplitter {
        counts: Vec<usize>,
        calls: Mutex<Vec<f32>>,
    }

    impl ScriptedSplitter {
        fn new(counts: Vec<usize>) -> Self {
            Self {
                counts,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl SilenceSplitter for ScriptedSplitter {
        fn split(
            &self,
            waveform: &Waveform,
            _min_silence_ms: u32,
            threshold_dbfs: f32,
        ) -> Vec<Range<usize>> {
            let mut calls = self.calls.lock().unwrap();
            let n = self.counts.get(calls.len()).copied().unwrap_or(0);
            calls.push(threshold_dbfs);

            // n equal-width dummy spans
            let width = waveform.len() / n.max(1);
            (0..n).map(|i| i * width..(i + 1) * width).collect()
        }
    }

    fn loud_wave() -> Waveform {
        // Constant-amplitude signal: avg loudness 20*log10(1036/32767) ≈ -30 dBFS.
        Waveform::new(vec![1036i16; 48000], 16000)
    }

    fn config() -> SegmenterConfig {
        SegmenterConfig {
            min_silence_ms: 2000,
            candidate_offsets: vec![-0.5, -1.0, -1.5],
        }
    }

    #[test]
    fn test_search_picks_max_chunk_count() {
        // avg ≈ -30; candidates -30.5/-31/-31.5 yield 3/5/4 → -31 wins with 5.
        let segmenter = AudioSegmenter::new(config(), ScriptedSplitter::new(vec![3, 5, 4]));
        let profile = segmenter.search(&loud_wave());

        assert_eq!(profile.spans.len(), 5);
        assert_eq!(profile.offset, -1.0);
        assert!(
            (profile.threshold_dbfs - (-31.0)).abs() < 0.05,
            "expected ~-31 dBFS, got {}",
            profile.threshold_dbfs
        );
    }

    #[test]
    fn test_search_tie_prefers_earlier_candidate() {
        let segmenter = AudioSegmenter::new(config(), ScriptedSplitter::new(vec![4, 4, 4]));
        let profile = segmenter.search(&loud_wave());
        assert_eq!(profile.offset, -0.5);
    }

    #[test]
    fn test_search_tries_every_candidate() {
        let splitter = ScriptedSplitter::new(vec![1, 1, 1]);
        let segmenter = AudioSegmenter::new(config(), splitter);
        let wave = loud_wave();
        let avg = wave.dbfs();
        segmenter.search(&wave);

        let calls = segmenter.splitter.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        for (call, offset) in calls.iter().zip([-0.5f32, -1.0, -1.5]) {
            assert!((call - (avg + offset)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_segment_indices_contiguous() {
        let segmenter = AudioSegmenter::new(config(), ScriptedSplitter::new(vec![2, 6, 3]));
        let chunks = segmenter.segment(&loud_wave());

        assert_eq!(chunks.len(), 6);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index(), i as u32);
        }
    }

    #[test]
    fn test_segment_all_zero_candidates_degenerates_to_full_chunk() {
        let segmenter = AudioSegmenter::new(config(), ScriptedSplitter::new(vec![0, 0, 0]));
        let wave = loud_wave();
        let chunks = segmenter.segment(&wave);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index(), 0);
        assert_eq!(chunks[0].samples().len(), wave.len());
    }

    #[test]
    fn test_segment_deterministic() {
        let wave = loud_wave();
        let a = AudioSegmenter::new(config(), ScriptedSplitter::new(vec![2, 4, 3])).segment(&wave);
        let b = AudioSegmenter::new(config(), ScriptedSplitter::new(vec![2, 4, 3])).segment(&wave);
        assert_eq!(a, b);
    }

    #[test]
    fn test_chunk_wav_bytes_header() {
        let chunk = Chunk {
            index: 0,
            samples: vec![100i16; 1600],
            sample_rate: 16000,
        };
        let bytes = chunk.wav_bytes().unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte header + 2 bytes per sample
        assert_eq!(bytes.len(), 44 + 1600 * 2);
    }

    #[test]
    fn test_real_splitter_end_to_end() {
        use crate::audio::splitter::FrameSplitter;

        // speech 1s, quiet 3s, speech 1s
        let mut samples = vec![8000i16; 16000];
        samples.extend(vec![10i16; 48000]);
        samples.extend(vec![8000i16; 16000]);
        let wave = Waveform::new(samples, 16000);

        let segmenter = AudioSegmenter::new(config(), FrameSplitter::new());
        let chunks = segmenter.segment(&wave);

        // The quiet span sits far below avg-1.5 dBFS, so any candidate splits.
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].samples().len(), 16000);
        assert_eq!(chunks[1].samples().len(), 16000);
    }
}
