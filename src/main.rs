use anyhow::{Context, Result};
use clap::Parser;
use notate::assemble;
use notate::audio::decoder::{Decoder, SymphoniaDecoder};
use notate::audio::splitter::FrameSplitter;
use notate::cli::Cli;
use notate::config::Config;
use notate::segment::AudioSegmenter;
use notate::transcribe::http::{HttpBackend, HttpBlobStore};
use notate::transcribe::orchestrator::{
    AbortReason, Orchestrator, OrchestratorConfig, RunOutcome,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Decode is fatal: nothing is submitted for an unreadable input.
    let decoder = SymphoniaDecoder::new();
    let waveform = decoder
        .decode(&cli.input_file)
        .with_context(|| format!("cannot transcribe {}", cli.input_file.display()))?;

    let segmenter = AudioSegmenter::new(config.segmenter.clone(), FrameSplitter::new());
    if cli.verbose {
        let profile = segmenter.search(&waveform);
        eprintln!(
            "notate: avg loudness {:.1} dBFS, selected threshold {:.1} dBFS (offset {:.1}), {} chunk(s)",
            waveform.dbfs(),
            profile.threshold_dbfs,
            profile.offset,
            profile.spans.len()
        );
    }
    let chunks = segmenter.segment(&waveform);
    if !cli.quiet {
        eprintln!("notate: got {} audio chunk(s)", chunks.len());
    }

    let run_id = Uuid::new_v4().to_string();
    let orchestrator_config = OrchestratorConfig {
        language: config.transcribe.language.clone(),
        media_format: config.transcribe.media_format.clone(),
        input_bucket: cli.input_bucket.clone(),
        output_bucket: cli.output_bucket.clone(),
        poll_interval: Duration::from_secs(config.transcribe.poll_interval_secs),
        submit_attempts: config.transcribe.submit_attempts,
        max_poll_failures: config.transcribe.max_poll_failures,
        quiet: cli.quiet,
    };

    let backend = Arc::new(HttpBackend::new(&config.backend.endpoint));
    let store = Arc::new(HttpBlobStore::new(&config.backend.endpoint));
    let orchestrator = Orchestrator::new(orchestrator_config, backend, store);

    // Ctrl-C flips the cancel flag; the run stops at the next cycle boundary
    // with every gathered result intact.
    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("notate: interrupt received, finishing current poll cycle");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let outcome = orchestrator.run(&chunks, &run_id).await?;
    print_outcome(&outcome)?;

    match &outcome.abort {
        None => Ok(ExitCode::SUCCESS),
        Some(AbortReason::Cancelled) => {
            eprintln!("notate: run cancelled; partial results above");
            Ok(ExitCode::FAILURE)
        }
        Some(AbortReason::BackendUnavailable { cycles }) => {
            eprintln!("notate: backend unavailable after {cycles} failed poll cycles; partial results above");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match (&cli.config, Config::default_path()) {
        (Some(path), _) => Config::load(path)?,
        (None, Some(path)) => Config::load_or_default(&path)?,
        (None, None) => Config::default(),
    }
    .with_env_overrides();

    if let Some(silence) = cli.silence {
        config.segmenter.min_silence_ms = silence;
    }
    if let Some(ref language) = cli.language {
        config.transcribe.language = language.clone();
    }
    if let Some(ref endpoint) = cli.endpoint {
        config.backend.endpoint = endpoint.clone();
    }
    if let Some(secs) = cli.poll_interval {
        config.transcribe.poll_interval_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

/// Print the per-index listing and the final notes document.
///
/// Called on aborted runs too, so partial results are never discarded.
fn print_outcome(outcome: &RunOutcome) -> Result<()> {
    for line in assemble::render_lines(&outcome.results) {
        println!("{line}");
    }
    let document = assemble::notes_document(&outcome.results);
    println!("{}", serde_json::to_string(&document)?);
    Ok(())
}
