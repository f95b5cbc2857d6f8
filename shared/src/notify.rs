//! Fire-and-forget notification dispatch.
//!
//! Notifications ride along with a primary operation (an export, a batch
//! run) and must never fail it: every delivery error is logged, folded into
//! the [`DispatchReport`], and swallowed at this boundary.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("provider answered {status}: {detail}")]
    Provider { status: u16, detail: String },

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Delivery channel for an outbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Whatsapp,
}

/// One outbound message, channel-agnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub channel: Channel,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Outcome of a dispatch pass over all configured notifiers.
#[derive(Debug, Default, Serialize)]
pub struct DispatchReport {
    pub delivered: u32,
    /// (notifier name, error message) per failed delivery.
    pub failures: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Attempt delivery through every notifier. Failures are logged and
/// reported, never raised, so the caller's primary operation is unaffected.
pub async fn dispatch_all(notifiers: &[Box<dyn Notifier>], notification: &Notification) -> DispatchReport {
    let mut report = DispatchReport::default();

    for notifier in notifiers {
        match notifier.send(notification).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::warn!(
                    notifier = notifier.name(),
                    error = %e,
                    "notification delivery failed"
                );
                report.failures.push((notifier.name().to_string(), e.to_string()));
            }
        }
    }

    report
}

/// Posts notifications as JSON to a provider webhook.
pub struct WebhookNotifier {
    name: String,
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(name: &str, url: &str) -> Self {
        WebhookNotifier {
            name: name.to_string(),
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(NotifyError::Provider { status, detail });
        }

        Ok(())
    }
}
