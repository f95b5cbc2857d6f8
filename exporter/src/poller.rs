//! Turns a fire-and-poll conversion provider into one blocking-style call
//! with a bounded wait.

use crate::config::PollerSettings;
use crate::errors::{ExportError, Result};
use crate::job::{Artifact, ArtifactFetcher, JobState, JobSubmitter, RenderJob, RenderRequest};
use crate::metrics_defs;
use serde::Serialize;
use tokio::time::sleep;

/// Diagnostic result shape for troubleshooting a provider. Unlike
/// [`JobPoller::generate`], building a trace never fails on a terminal
/// non-success state.
#[derive(Debug, Serialize)]
pub struct JobTrace {
    pub final_status: String,
    pub attempts: u32,
    pub download_url: Option<String>,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip)]
    pub artifact: Option<Artifact>,
}

/// Drives one conversion job from submission to a terminal state.
pub struct JobPoller {
    settings: PollerSettings,
}

impl JobPoller {
    pub fn new(settings: PollerSettings) -> Self {
        JobPoller { settings }
    }

    /// Submit `request`, poll until terminal, download the artifact.
    ///
    /// Submission failures are not retried within one call; a job that
    /// reported success but whose artifact cannot be downloaded is fatal
    /// for this call too, since resubmitting a fresh job is the caller's
    /// cheaper recovery path.
    pub async fn generate(
        &self,
        submitter: &dyn JobSubmitter,
        fetcher: &dyn ArtifactFetcher,
        request: &RenderRequest,
    ) -> Result<Artifact> {
        let job = self.run_to_terminal(submitter, request).await?;

        match job.state {
            JobState::Succeeded { download_url } => fetcher.fetch(&download_url).await,
            JobState::Failed { status } => Err(ExportError::Provider { status }),
            JobState::PollingFailed { reason } => Err(ExportError::Polling(reason)),
            JobState::TimedOut | JobState::Pending => Err(ExportError::TimedOut {
                attempts: job.attempts,
            }),
        }
    }

    /// Diagnostic variant: same flow, but terminal non-success states and
    /// download failures are folded into the returned trace.
    pub async fn generate_traced(
        &self,
        submitter: &dyn JobSubmitter,
        fetcher: &dyn ArtifactFetcher,
        request: &RenderRequest,
    ) -> Result<JobTrace> {
        let job = self.run_to_terminal(submitter, request).await?;

        let mut trace = JobTrace {
            final_status: job.state.describe(),
            attempts: job.attempts,
            download_url: job.state.download_url().map(String::from),
            succeeded: false,
            error: None,
            artifact: None,
        };

        match job.state {
            JobState::Succeeded { download_url } => match fetcher.fetch(&download_url).await {
                Ok(artifact) => {
                    trace.succeeded = true;
                    trace.artifact = Some(artifact);
                }
                Err(e) => trace.error = Some(e.to_string()),
            },
            JobState::Failed { status } => {
                trace.error = Some(ExportError::Provider { status }.to_string());
            }
            JobState::PollingFailed { reason } => {
                trace.error = Some(ExportError::Polling(reason).to_string());
            }
            JobState::TimedOut | JobState::Pending => {
                trace.error = Some(
                    ExportError::TimedOut {
                        attempts: job.attempts,
                    }
                    .to_string(),
                );
            }
        }

        Ok(trace)
    }

    /// Submits the job and polls it into a terminal state.
    ///
    /// Loop invariant: continues only while the state is `Pending` and
    /// fewer than `max_attempts` checks have been made. A job still
    /// pending when the budget runs out becomes `TimedOut`.
    async fn run_to_terminal(
        &self,
        submitter: &dyn JobSubmitter,
        request: &RenderRequest,
    ) -> Result<RenderJob> {
        let receipt = submitter.submit(request).await?;
        metrics::counter!(metrics_defs::JOBS_SUBMITTED.name).increment(1);

        let status_url = receipt
            .status_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                ExportError::Protocol("submission response carried no status_url".to_string())
            })?;

        let mut job = RenderJob::submitted(status_url);

        while job.state == JobState::Pending && job.attempts < self.settings.max_attempts {
            sleep(self.settings.poll_interval()).await;
            job.attempts += 1;

            match submitter.check_status(&job.status_url).await {
                Ok(report) => job.state = JobState::from_report(&report),
                // The check itself failing is terminal; the provider may
                // still finish the job on its side, but this call is done.
                Err(e) => {
                    job.state = JobState::PollingFailed {
                        reason: e.to_string(),
                    }
                }
            }
        }

        if job.state == JobState::Pending {
            job.state = JobState::TimedOut;
            metrics::counter!(metrics_defs::JOB_TIMEOUTS.name).increment(1);
        }

        metrics::histogram!(metrics_defs::JOB_POLL_ATTEMPTS.name).record(job.attempts as f64);
        tracing::debug!(
            status = %job.state.describe(),
            attempts = job.attempts,
            "conversion job reached terminal state"
        );

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{StatusReport, SubmissionReceipt};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    const STATUS_URL: &str = "https://provider.example/status/42";

    fn settings(max_attempts: u32) -> PollerSettings {
        PollerSettings {
            poll_interval_millis: 1,
            max_attempts,
        }
    }

    /// Submitter fed from a fixed script of status reports.
    struct ScriptedSubmitter {
        receipt_status_url: Option<String>,
        reports: Vec<StatusReport>,
        checks: AtomicU32,
    }

    impl ScriptedSubmitter {
        fn with_reports(reports: Vec<StatusReport>) -> Self {
            ScriptedSubmitter {
                receipt_status_url: Some(STATUS_URL.to_string()),
                reports,
                checks: AtomicU32::new(0),
            }
        }

        fn check_count(&self) -> u32 {
            self.checks.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobSubmitter for ScriptedSubmitter {
        async fn submit(&self, _request: &RenderRequest) -> Result<SubmissionReceipt> {
            Ok(SubmissionReceipt {
                document_id: Some("doc-42".to_string()),
                status_url: self.receipt_status_url.clone(),
            })
        }

        async fn check_status(&self, status_url: &str) -> Result<StatusReport> {
            assert_eq!(status_url, STATUS_URL);
            let n = self.checks.fetch_add(1, Ordering::SeqCst) as usize;
            match self.reports.get(n) {
                Some(report) => Ok(report.clone()),
                None => Err(ExportError::Polling("script exhausted".to_string())),
            }
        }
    }

    struct RecordingFetcher {
        fetched: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingFetcher {
        fn new() -> Self {
            RecordingFetcher {
                fetched: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl ArtifactFetcher for RecordingFetcher {
        async fn fetch(&self, download_url: &str) -> Result<Artifact> {
            self.fetched.lock().unwrap().push(download_url.to_string());
            if self.fail {
                return Err(ExportError::Download("fetch answered 410 Gone".to_string()));
            }
            Ok(Artifact::new(Bytes::from_static(b"%PDF-1.7 fake")))
        }
    }

    fn pending() -> StatusReport {
        StatusReport {
            status: "pending".to_string(),
            download_url: None,
            preview_url: None,
        }
    }

    fn success(download_url: &str) -> StatusReport {
        StatusReport {
            status: "success".to_string(),
            download_url: Some(download_url.to_string()),
            preview_url: None,
        }
    }

    #[tokio::test]
    async fn pending_then_success_fetches_artifact() {
        let submitter = ScriptedSubmitter::with_reports(vec![
            pending(),
            pending(),
            success("https://x/f.pdf"),
        ]);
        let fetcher = RecordingFetcher::new();
        let poller = JobPoller::new(settings(30));

        let artifact = poller
            .generate(&submitter, &fetcher, &RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap();

        assert_eq!(artifact.size_bytes, 13);
        assert_eq!(submitter.check_count(), 3);
        assert_eq!(*fetcher.fetched.lock().unwrap(), vec!["https://x/f.pdf"]);
    }

    #[tokio::test]
    async fn pending_forever_times_out_at_the_attempt_budget() {
        let submitter = ScriptedSubmitter::with_reports(vec![pending(); 50]);
        let fetcher = RecordingFetcher::new();
        let poller = JobPoller::new(settings(5));

        let err = poller
            .generate(&submitter, &fetcher, &RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::TimedOut { attempts: 5 }));
        // Never polls past the budget.
        assert_eq!(submitter.check_count(), 5);
        assert!(fetcher.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_terminal_on_first_poll() {
        let submitter = ScriptedSubmitter::with_reports(vec![StatusReport {
            status: "failed".to_string(),
            download_url: None,
            preview_url: None,
        }]);
        let fetcher = RecordingFetcher::new();
        let poller = JobPoller::new(settings(30));

        let err = poller
            .generate(&submitter, &fetcher, &RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap_err();

        match err {
            ExportError::Provider { status } => assert_eq!(status, "failed"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(submitter.check_count(), 1);
    }

    #[tokio::test]
    async fn preview_fallback_feeds_the_fetcher() {
        let submitter = ScriptedSubmitter::with_reports(vec![StatusReport {
            status: "success".to_string(),
            download_url: None,
            preview_url: Some(
                "https://provider.example/preview/42?file=https://cdn.example/f.pdf".to_string(),
            ),
        }]);
        let fetcher = RecordingFetcher::new();
        let poller = JobPoller::new(settings(30));

        poller
            .generate(&submitter, &fetcher, &RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap();

        assert_eq!(
            *fetcher.fetched.lock().unwrap(),
            vec!["https://cdn.example/f.pdf"]
        );
    }

    #[tokio::test]
    async fn missing_status_url_is_a_protocol_error_before_any_poll() {
        let submitter = ScriptedSubmitter {
            receipt_status_url: None,
            reports: vec![pending()],
            checks: AtomicU32::new(0),
        };
        let fetcher = RecordingFetcher::new();
        let poller = JobPoller::new(settings(30));

        let err = poller
            .generate(&submitter, &fetcher, &RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Protocol(_)));
        assert_eq!(submitter.check_count(), 0);
    }

    #[tokio::test]
    async fn failed_status_check_is_a_polling_error() {
        // Empty script: the first check errors.
        let submitter = ScriptedSubmitter::with_reports(vec![]);
        let fetcher = RecordingFetcher::new();
        let poller = JobPoller::new(settings(30));

        let err = poller
            .generate(&submitter, &fetcher, &RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Polling(_)));
        assert_eq!(submitter.check_count(), 1);
    }

    #[tokio::test]
    async fn download_failure_is_fatal_without_retry() {
        let submitter = ScriptedSubmitter::with_reports(vec![success("https://x/f.pdf")]);
        let fetcher = RecordingFetcher {
            fetched: Mutex::new(Vec::new()),
            fail: true,
        };
        let poller = JobPoller::new(settings(30));

        let err = poller
            .generate(&submitter, &fetcher, &RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Download(_)));
        assert_eq!(fetcher.fetched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn trace_reports_provider_failure_without_raising() {
        let submitter = ScriptedSubmitter::with_reports(vec![StatusReport {
            status: "failure".to_string(),
            download_url: None,
            preview_url: None,
        }]);
        let fetcher = RecordingFetcher::new();
        let poller = JobPoller::new(settings(30));

        let trace = poller
            .generate_traced(&submitter, &fetcher, &RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap();

        assert!(!trace.succeeded);
        assert_eq!(trace.final_status, "failure");
        assert_eq!(trace.attempts, 1);
        assert!(trace.download_url.is_none());
        assert!(trace.error.is_some());
    }

    #[tokio::test]
    async fn trace_carries_artifact_on_success() {
        let submitter = ScriptedSubmitter::with_reports(vec![pending(), success("https://x/f.pdf")]);
        let fetcher = RecordingFetcher::new();
        let poller = JobPoller::new(settings(30));

        let trace = poller
            .generate_traced(&submitter, &fetcher, &RenderRequest::new("<html/>", "order.pdf"))
            .await
            .unwrap();

        assert!(trace.succeeded);
        assert_eq!(trace.final_status, "success");
        assert_eq!(trace.attempts, 2);
        assert_eq!(trace.download_url.as_deref(), Some("https://x/f.pdf"));
        assert!(trace.artifact.is_some());
        assert!(trace.error.is_none());
    }
}
