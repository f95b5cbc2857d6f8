//! HTTP client for the asynchronous (submit/poll/download) provider style.

use crate::errors::{ExportError, Result};
use crate::job::{
    Artifact, ArtifactFetcher, JobSubmitter, RenderRequest, StatusReport, SubmissionReceipt,
};
use async_trait::async_trait;

/// Client for a job-based conversion provider.
///
/// Implements both provider-facing traits: submission/status checks and
/// artifact download. Download locations are absolute URLs handed out by
/// the provider, so fetches go wherever the provider points (typically a
/// CDN), not to `base_url`.
#[derive(Clone)]
pub struct RenderApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RenderApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        RenderApiClient {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl JobSubmitter for RenderApiClient {
    async fn submit(&self, request: &RenderRequest) -> Result<SubmissionReceipt> {
        let url = format!("{}/documents", self.base_url);
        let body = serde_json::json!({
            "document": {
                "source": request.source,
                "filename": request.filename,
                "meta": request.meta,
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExportError::Submission(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExportError::Submission(format!(
                "provider answered {} for {url}",
                response.status()
            )));
        }

        response
            .json::<SubmissionReceipt>()
            .await
            .map_err(|e| ExportError::Protocol(format!("unreadable submission response: {e}")))
    }

    async fn check_status(&self, status_url: &str) -> Result<StatusReport> {
        let response = self
            .client
            .get(status_url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ExportError::Polling(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExportError::Polling(format!(
                "status check answered {}",
                response.status()
            )));
        }

        response
            .json::<StatusReport>()
            .await
            .map_err(|e| ExportError::Polling(format!("unreadable status response: {e}")))
    }
}

#[async_trait]
impl ArtifactFetcher for RenderApiClient {
    async fn fetch(&self, download_url: &str) -> Result<Artifact> {
        let response = self
            .client
            .get(download_url)
            .send()
            .await
            .map_err(|e| ExportError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExportError::Download(format!(
                "artifact fetch answered {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::Download(e.to_string()))?;

        Ok(Artifact::new(bytes))
    }
}
