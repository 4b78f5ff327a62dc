//! Error types for notate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotateError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Decode errors (fatal, before any submission)
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    // Per-chunk submission-phase errors
    #[error("Upload of {key} failed after {attempts} attempts: {message}")]
    Upload {
        key: String,
        attempts: u32,
        message: String,
    },

    #[error("Submission of job {job_id} failed after {attempts} attempts: {message}")]
    Submission {
        job_id: String,
        attempts: u32,
        message: String,
    },

    // Polling-phase errors
    #[error("Job {job_id} failed on the backend: {reason}")]
    JobFailed { job_id: String, reason: String },

    #[error("Result artifact for job {job_id} did not match expected schema: {message}")]
    ResultParse { job_id: String, message: String },

    #[error("Backend transport error: {message}")]
    Transport { message: String },

    #[error("Backend unavailable: {cycles} consecutive poll cycles failed")]
    BackendUnavailable { cycles: u32 },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, NotateError>;
