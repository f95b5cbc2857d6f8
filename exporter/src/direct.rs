//! Single-call conversion: POST the source, get the artifact bytes back.
//!
//! No state machine here; the provider converts inline subject to its own
//! size and timeout limits. On failure the provider's status and body text
//! are surfaced verbatim so its diagnostics reach the operator unmangled.

use crate::errors::{ExportError, Result};
use crate::job::{Artifact, RenderRequest};
use async_trait::async_trait;

/// Anything that can turn a render request into a finished artifact.
///
/// Implemented by [`DirectConverter`] and by the polled adapter in
/// [`crate::chain`], so callers pick the provider style by configuration.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, request: &RenderRequest) -> Result<Artifact>;
}

/// Client for a synchronous conversion provider.
#[derive(Clone)]
pub struct DirectConverter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DirectConverter {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        DirectConverter {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl DocumentConverter for DirectConverter {
    async fn convert(&self, request: &RenderRequest) -> Result<Artifact> {
        let url = format!("{}/convert", self.base_url);
        let body = serde_json::json!({
            "source": request.source,
            "filename": request.filename,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExportError::Submission(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExportError::Conversion {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::Download(e.to_string()))?;

        Ok(Artifact::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn convert_returns_artifact_bytes() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/convert"))
            .and(header("authorization", "Bearer k-456"))
            .and(body_partial_json(
                serde_json::json!({"filename": "order.pdf"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 direct".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let converter = DirectConverter::new(&server.uri(), "k-456");
        let artifact = converter
            .convert(&RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap();

        assert_eq!(artifact.content.as_ref(), b"%PDF-1.7 direct");
        assert_eq!(artifact.size_bytes, 15);
    }

    #[tokio::test]
    async fn failure_surfaces_provider_status_and_body_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/convert"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":"source exceeds 2MB limit"}"#),
            )
            .mount(&server)
            .await;

        let converter = DirectConverter::new(&server.uri(), "k-456");
        let err = converter
            .convert(&RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap_err();

        match err {
            ExportError::Conversion { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, r#"{"error":"source exceeds 2MB limit"}"#);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
