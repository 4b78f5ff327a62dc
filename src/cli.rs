//! Command-line interface for notate
//!
//! Provides argument parsing using clap derive macros.

use clap::Parser;
use std::path::PathBuf;

/// Segment a recording on silence and batch-transcribe the chunks
#[derive(Parser, Debug)]
#[command(
    name = "notate",
    version,
    about = "Segment a recording on silence and batch-transcribe the chunks"
)]
pub struct Cli {
    /// Audio file to transcribe (MP3, M4A, AAC, WAV)
    pub input_file: PathBuf,

    /// Bucket chunk audio is uploaded to
    pub input_bucket: String,

    /// Bucket the backend writes result artifacts to
    pub output_bucket: String,

    /// Minimum silence duration in milliseconds for chunk splitting (default: 2000)
    #[arg(long, value_name = "MS")]
    pub silence: Option<u32>,

    /// Poll interval (default: 5s). Examples: 10, 30s, 2m
    #[arg(long, value_name = "DURATION", value_parser = parse_interval_secs)]
    pub poll_interval: Option<u64>,

    /// Language code sent with each transcription job (e.g. en-US)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Backend endpoint override
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress progress output (quiet mode)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose progress output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parse a poll-interval string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`), and compound (`1m30s`).
fn parse_interval_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    #[test]
    fn test_positional_arguments() {
        let cli = parse(&["notate", "talk.mp3", "inputs", "outputs"]);
        assert_eq!(cli.input_file, PathBuf::from("talk.mp3"));
        assert_eq!(cli.input_bucket, "inputs");
        assert_eq!(cli.output_bucket, "outputs");
    }

    #[test]
    fn test_missing_positional_is_error() {
        assert!(Cli::try_parse_from(["notate", "talk.mp3"]).is_err());
    }

    #[test]
    fn test_silence_defaults_to_config() {
        let cli = parse(&["notate", "a.wav", "in", "out"]);
        assert_eq!(cli.silence, None);
    }

    #[test]
    fn test_silence_override() {
        let cli = parse(&["notate", "a.wav", "in", "out", "--silence", "1200"]);
        assert_eq!(cli.silence, Some(1200));
    }

    #[test]
    fn test_poll_interval_formats() {
        let cli = parse(&["notate", "a.wav", "in", "out", "--poll-interval", "10"]);
        assert_eq!(cli.poll_interval, Some(10));

        let cli = parse(&["notate", "a.wav", "in", "out", "--poll-interval", "30s"]);
        assert_eq!(cli.poll_interval, Some(30));

        let cli = parse(&["notate", "a.wav", "in", "out", "--poll-interval", "1m30s"]);
        assert_eq!(cli.poll_interval, Some(90));
    }

    #[test]
    fn test_invalid_poll_interval_is_error() {
        assert!(
            Cli::try_parse_from(["notate", "a.wav", "in", "out", "--poll-interval", "soon"])
                .is_err()
        );
    }

    #[test]
    fn test_flags() {
        let cli = parse(&[
            "notate", "a.wav", "in", "out", "--language", "de-DE", "-q",
        ]);
        assert_eq!(cli.language.as_deref(), Some("de-DE"));
        assert!(cli.quiet);
        assert!(!cli.verbose);
    }
}
