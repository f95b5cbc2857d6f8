//! Conversion job model: wire shapes, the typed job state machine, and the
//! traits the orchestration layer uses to talk to a provider.

use crate::errors::Result;
use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Document source handed to a conversion provider. Immutable once submitted.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest {
    /// Template or markup content to render.
    pub source: String,
    pub filename: String,
    /// Provider-visible metadata, serialized in insertion order.
    pub meta: IndexMap<String, String>,
}

impl RenderRequest {
    pub fn new(source: impl Into<String>, filename: impl Into<String>) -> Self {
        RenderRequest {
            source: source.into(),
            filename: filename.into(),
            meta: IndexMap::new(),
        }
    }
}

/// Submission acknowledgement from the provider.
///
/// A conforming provider always returns a status locator; the poller treats
/// its absence as a broken contract, not as a retriable condition.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionReceipt {
    pub document_id: Option<String>,
    pub status_url: Option<String>,
}

/// One status-check response, as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusReport {
    pub status: String,
    pub download_url: Option<String>,
    pub preview_url: Option<String>,
}

/// Typed state of a conversion job.
///
/// A job leaves `Pending` exactly once; every other variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Succeeded { download_url: String },
    /// The provider reported a terminal status other than success.
    Failed { status: String },
    /// The poll budget ran out while the provider still said pending.
    TimedOut,
    /// A status check failed, or a success report carried no usable
    /// download location.
    PollingFailed { reason: String },
}

impl JobState {
    /// Computes the transition out of `Pending` for one status report.
    ///
    /// Pure function of the report, so the timeout and fallback edge cases
    /// are testable without any network.
    pub fn from_report(report: &StatusReport) -> JobState {
        match report.status.as_str() {
            "pending" | "queued" | "generating" | "processing" => JobState::Pending,
            "success" => match resolve_download_url(report) {
                Some(download_url) => JobState::Succeeded { download_url },
                None => JobState::PollingFailed {
                    reason: "success report carried no download location".to_string(),
                },
            },
            other => JobState::Failed {
                status: other.to_string(),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Pending)
    }

    /// Status label for traces and logs. Provider-reported failures keep
    /// the provider's own status string.
    pub fn describe(&self) -> String {
        match self {
            JobState::Pending => "pending".to_string(),
            JobState::Succeeded { .. } => "success".to_string(),
            JobState::Failed { status } => status.clone(),
            JobState::TimedOut => "timed_out".to_string(),
            JobState::PollingFailed { .. } => "polling_error".to_string(),
        }
    }

    pub fn download_url(&self) -> Option<&str> {
        match self {
            JobState::Succeeded { download_url } => Some(download_url),
            _ => None,
        }
    }
}

/// Picks the artifact location out of a success report.
///
/// Prefers the direct `download_url`. Some providers omit it and instead
/// embed the real file location in the preview link's query string
/// (`?file=<url>`); that is a documented quirk, so it is extracted here
/// rather than treated as a failure.
pub fn resolve_download_url(report: &StatusReport) -> Option<String> {
    if let Some(url) = report.download_url.as_deref()
        && !url.is_empty()
    {
        return Some(url.to_string());
    }

    let preview = Url::parse(report.preview_url.as_deref()?).ok()?;
    preview
        .query_pairs()
        .find(|(key, _)| key == "file")
        .map(|(_, value)| value.into_owned())
}

/// One in-flight conversion job. Created at submission with `Pending`
/// state, driven to a terminal state by the poller, never reused.
#[derive(Debug)]
pub struct RenderJob {
    pub status_url: String,
    /// Number of status checks performed so far.
    pub attempts: u32,
    pub state: JobState,
}

impl RenderJob {
    pub fn submitted(status_url: String) -> Self {
        RenderJob {
            status_url,
            attempts: 0,
            state: JobState::Pending,
        }
    }
}

/// A finished document.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub content: Bytes,
    pub size_bytes: usize,
}

impl Artifact {
    pub fn new(content: Bytes) -> Self {
        let size_bytes = content.len();
        Artifact {
            content,
            size_bytes,
        }
    }
}

/// Submission and status-check side of an asynchronous conversion provider.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(&self, request: &RenderRequest) -> Result<SubmissionReceipt>;

    async fn check_status(&self, status_url: &str) -> Result<StatusReport>;
}

/// Retrieval of a finished artifact by download location.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, download_url: &str) -> Result<Artifact>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: &str, download: Option<&str>, preview: Option<&str>) -> StatusReport {
        StatusReport {
            status: status.to_string(),
            download_url: download.map(String::from),
            preview_url: preview.map(String::from),
        }
    }

    #[test]
    fn pending_statuses_stay_pending() {
        for status in ["pending", "queued", "generating", "processing"] {
            assert_eq!(JobState::from_report(&report(status, None, None)), JobState::Pending);
        }
    }

    #[test]
    fn success_with_download_url_succeeds() {
        let state = JobState::from_report(&report("success", Some("https://x/f.pdf"), None));
        assert_eq!(
            state,
            JobState::Succeeded {
                download_url: "https://x/f.pdf".to_string()
            }
        );
    }

    #[test]
    fn success_without_any_location_is_a_polling_failure() {
        let state = JobState::from_report(&report("success", None, None));
        assert!(matches!(state, JobState::PollingFailed { .. }));
        assert!(state.is_terminal());
    }

    #[test]
    fn empty_download_url_is_treated_as_absent() {
        let state = JobState::from_report(&report("success", Some(""), None));
        assert!(matches!(state, JobState::PollingFailed { .. }));
    }

    #[test]
    fn unknown_status_is_provider_terminal() {
        let state = JobState::from_report(&report("failed", None, None));
        assert_eq!(
            state,
            JobState::Failed {
                status: "failed".to_string()
            }
        );
    }

    #[test]
    fn file_location_is_extracted_from_preview_query() {
        let preview = "https://provider.example/preview/42?file=https://cdn.example/f.pdf&ttl=60";
        let url = resolve_download_url(&report("success", None, Some(preview)));
        assert_eq!(url.as_deref(), Some("https://cdn.example/f.pdf"));
    }

    #[test]
    fn direct_download_url_wins_over_preview() {
        let preview = "https://provider.example/preview/42?file=https://cdn.example/other.pdf";
        let url = resolve_download_url(&report("success", Some("https://x/f.pdf"), Some(preview)));
        assert_eq!(url.as_deref(), Some("https://x/f.pdf"));
    }

    #[test]
    fn preview_without_file_param_yields_nothing() {
        let preview = "https://provider.example/preview/42?ttl=60";
        assert_eq!(resolve_download_url(&report("success", None, Some(preview))), None);
    }

    #[test]
    fn unparseable_preview_yields_nothing() {
        assert_eq!(
            resolve_download_url(&report("success", None, Some("not a url"))),
            None
        );
    }
}
