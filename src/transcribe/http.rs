//! HTTP reference adapter for the backend and blob-store capabilities.
//!
//! Talks to a generic REST endpoint:
//! - `PUT/GET {endpoint}/{bucket}/{key}` for blobs
//! - `POST {endpoint}/jobs` to submit, `GET {endpoint}/jobs/{job_id}` for status
//!
//! This module is the only provider-specific code in the crate; everything
//! else sees the [`TranscriptionBackend`] and [`BlobStore`] traits.

use crate::error::{NotateError, Result};
use crate::transcribe::backend::{BlobStore, JobStatus, TranscriptionBackend};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

fn transport(e: impl std::fmt::Display) -> NotateError {
    NotateError::Transport {
        message: e.to_string(),
    }
}

/// Job submission request body.
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    job_id: &'a str,
    language_code: &'a str,
    media_format: &'a str,
    media_uri: &'a str,
    output_bucket: &'a str,
}

/// Job status response body.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: JobStatus,
}

/// Blob store speaking plain HTTP PUT/GET.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBlobStore {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, key)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        let response = self
            .client
            .put(self.object_url(bucket, key))
            .body(bytes)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(transport(format!(
                "PUT {bucket}/{key} returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.object_url(bucket, key))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(transport(format!(
                "GET {bucket}/{key} returned {}",
                response.status()
            )));
        }
        Ok(response.bytes().await.map_err(transport)?.to_vec())
    }
}

/// Transcription backend speaking the REST job protocol.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TranscriptionBackend for HttpBackend {
    async fn submit(
        &self,
        job_id: &str,
        language: &str,
        media_format: &str,
        media_uri: &str,
        output_bucket: &str,
    ) -> Result<()> {
        let body = SubmitRequest {
            job_id,
            language_code: language,
            media_format,
            media_uri,
            output_bucket,
        };
        let response = self
            .client
            .post(format!("{}/jobs", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(transport(format!(
                "submit {job_id} returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        let response = self
            .client
            .get(format!("{}/jobs/{}", self.endpoint, job_id))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(transport(format!(
                "status {job_id} returned {}",
                response.status()
            )));
        }

        let status: StatusResponse = response.json().await.map_err(transport)?;
        Ok(status.status)
    }
}
