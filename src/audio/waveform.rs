//! Decoded waveform representation and loudness measurement.
//!
//! Loudness is measured in dBFS: 20·log10 of the RMS level normalized to
//! 16-bit full scale. Digital silence is negative infinity.

/// A decoded recording: mono 16-bit samples plus their sample rate.
///
/// Immutable once decoded; the segmenter borrows it for the duration of the
/// threshold search.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the recording in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }

    /// Average loudness of the whole recording in dBFS.
    pub fn dbfs(&self) -> f32 {
        dbfs_of(&self.samples)
    }
}

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// Returns a normalized value in [0.0, 1.0] where 1.0 is 16-bit full scale.
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let normalized = s as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Loudness of a sample slice in dBFS.
///
/// Empty input and digital silence both return `f32::NEG_INFINITY`, which
/// compares below every finite threshold.
pub fn dbfs_of(samples: &[i16]) -> f32 {
    let rms = calculate_rms(samples);
    if rms <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * rms.log10()
    }
}
