//! End-to-end pipeline test: decode a real WAV fixture, segment it with the
//! adaptive threshold search, run the orchestrator against mocks, and check
//! the assembled output.

use notate::assemble::{notes_document, render_lines};
use notate::audio::decoder::{Decoder, SymphoniaDecoder};
use notate::audio::splitter::FrameSplitter;
use notate::segment::{AudioSegmenter, SegmenterConfig};
use notate::transcribe::backend::{JobStatus, MemoryBlobStore, MockBackend};
use notate::transcribe::orchestrator::{Orchestrator, OrchestratorConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const RATE: u32 = 16000;

/// Write a WAV with three 1s speech bursts separated by 2.5s of silence.
fn write_fixture(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for burst in 0..3 {
        for i in 0..RATE {
            // Audible tone, distinct frequency per burst
            let t = i as f32 / RATE as f32;
            let hz = 200.0 + 100.0 * burst as f32;
            let sample = ((t * hz * std::f32::consts::TAU).sin() * 8000.0) as i16;
            writer.write_sample(sample).unwrap();
        }
        for _ in 0..(RATE * 5 / 2) {
            writer.write_sample(0i16).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn artifact(text: &str) -> Vec<u8> {
    format!(r#"{{"results":{{"transcripts":[{{"transcript":"{text}"}}]}}}}"#).into_bytes()
}

fn run_config() -> OrchestratorConfig {
    OrchestratorConfig {
        input_bucket: "notate-inputs".to_string(),
        output_bucket: "notate-outputs".to_string(),
        poll_interval: Duration::ZERO,
        ..Default::default()
    }
}

#[tokio::test]
async fn decode_segment_transcribe_assemble() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("meeting.wav");
    write_fixture(&wav);

    let waveform = SymphoniaDecoder::new().decode(&wav).unwrap();
    assert_eq!(waveform.sample_rate(), RATE);

    let segmenter = AudioSegmenter::new(SegmenterConfig::default(), FrameSplitter::new());
    let chunks = segmenter.segment(&waveform);
    assert_eq!(chunks.len(), 3, "three speech bursts, three chunks");
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index(), i as u32);
        assert!(!chunk.samples().is_empty());
    }

    // Backend completes jobs out of order; job 1 fails permanently.
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("notate-outputs", "run-00000.json", artifact("first point"));
    store.insert("notate-outputs", "run-00002.json", artifact("last point"));
    let backend = Arc::new(
        MockBackend::new()
            .script("run-00000", &[JobStatus::Running, JobStatus::Completed])
            .script("run-00001", &[JobStatus::Failed])
            .script("run-00002", &[JobStatus::Completed]),
    );

    let orchestrator = Orchestrator::new(run_config(), backend, store.clone());
    let outcome = orchestrator.run(&chunks, "run").await.unwrap();

    assert!(outcome.is_resolved());
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.failed.len(), 1);

    // Every chunk was uploaded before submission.
    assert!(store.contains("notate-inputs", "run/00000.wav"));
    assert!(store.contains("notate-inputs", "run/00001.wav"));
    assert!(store.contains("notate-inputs", "run/00002.wav"));

    let lines = render_lines(&outcome.results);
    assert_eq!(lines, vec!["0: first point", "2: last point"]);

    let json = serde_json::to_string(&notes_document(&outcome.results)).unwrap();
    assert_eq!(
        json,
        r#"{"notes":{"00000":"first point","00002":"last point"}}"#
    );
}

#[tokio::test]
async fn whole_file_without_silence_becomes_one_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("steady.wav");

    // Constant tone, no silence anywhere: the degenerate single-chunk case.
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&wav, spec).unwrap();
    for i in 0..RATE * 3 {
        let t = i as f32 / RATE as f32;
        let sample = ((t * 220.0 * std::f32::consts::TAU).sin() * 8000.0) as i16;
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();

    let waveform = SymphoniaDecoder::new().decode(&wav).unwrap();
    let segmenter = AudioSegmenter::new(SegmenterConfig::default(), FrameSplitter::new());
    let chunks = segmenter.segment(&waveform);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].index(), 0);

    let store = Arc::new(MemoryBlobStore::new());
    store.insert("notate-outputs", "solo-00000.json", artifact("one note"));
    let backend = Arc::new(MockBackend::new().script("solo-00000", &[JobStatus::Completed]));

    let orchestrator = Orchestrator::new(run_config(), backend, store);
    let outcome = orchestrator.run(&chunks, "solo").await.unwrap();

    assert_eq!(outcome.results[&0].text, "one note");
}
