//! Two-stage generation: render structured order data to canonical markup,
//! then hand the markup to a conversion provider for the final binary.
//!
//! The stages fail distinguishably. A render failure carries the partial
//! markup for diagnostics; a conversion failure carries the finished markup
//! so the caller can retry stage 2 alone without re-rendering.

use crate::config::PollerSettings;
use crate::direct::DocumentConverter;
use crate::errors::{ExportError, Result};
use crate::job::{Artifact, ArtifactFetcher, JobSubmitter, RenderRequest};
use crate::poller::JobPoller;
use async_trait::async_trait;
use std::fmt::Write;
use std::sync::Arc;

/// Stage-1 failure: what went wrong plus whatever markup existed by then.
#[derive(Debug)]
pub struct RenderFailure {
    pub detail: String,
    pub partial_markup: String,
}

/// The canonical render step. Turns structured order data into
/// transport-ready markup.
#[async_trait]
pub trait MarkupRenderer: Send + Sync {
    async fn render(&self, order: &serde_json::Value) -> std::result::Result<String, RenderFailure>;
}

/// Composes the render step with a conversion path.
pub struct DocumentChain {
    renderer: Arc<dyn MarkupRenderer>,
    converter: Arc<dyn DocumentConverter>,
}

impl DocumentChain {
    pub fn new(renderer: Arc<dyn MarkupRenderer>, converter: Arc<dyn DocumentConverter>) -> Self {
        DocumentChain {
            renderer,
            converter,
        }
    }

    pub async fn generate(&self, order: &serde_json::Value, filename: &str) -> Result<Artifact> {
        let markup = self.renderer.render(order).await.map_err(|failure| {
            ExportError::UpstreamRender {
                detail: failure.detail,
                markup: failure.partial_markup,
            }
        })?;

        let request = RenderRequest::new(markup.clone(), filename);

        match self.converter.convert(&request).await {
            Ok(artifact) => Ok(artifact),
            Err(source) => Err(ExportError::ChainConversion {
                markup,
                source: Box::new(source),
            }),
        }
    }
}

/// Adapts the submit/poll/download flow to the [`DocumentConverter`] seam,
/// so the chain (and its callers) stay agnostic of the provider style.
pub struct PolledConverter<P> {
    poller: JobPoller,
    provider: Arc<P>,
}

impl<P> PolledConverter<P>
where
    P: JobSubmitter + ArtifactFetcher + 'static,
{
    pub fn new(settings: PollerSettings, provider: Arc<P>) -> Self {
        PolledConverter {
            poller: JobPoller::new(settings),
            provider,
        }
    }

    /// Diagnostic variant of [`DocumentConverter::convert`]; see
    /// [`JobPoller::generate_traced`].
    pub async fn convert_traced(&self, request: &RenderRequest) -> Result<crate::poller::JobTrace> {
        self.poller
            .generate_traced(self.provider.as_ref(), self.provider.as_ref(), request)
            .await
    }
}

#[async_trait]
impl<P> DocumentConverter for PolledConverter<P>
where
    P: JobSubmitter + ArtifactFetcher + 'static,
{
    async fn convert(&self, request: &RenderRequest) -> Result<Artifact> {
        self.poller
            .generate(self.provider.as_ref(), self.provider.as_ref(), request)
            .await
    }
}

/// Renders an order into a minimal HTML document.
///
/// The platform's canonical templates live upstream; this renderer covers
/// the fields every order carries so the chain works out of the box.
pub struct BasicOrderRenderer;

#[async_trait]
impl MarkupRenderer for BasicOrderRenderer {
    async fn render(&self, order: &serde_json::Value) -> std::result::Result<String, RenderFailure> {
        let mut markup = String::from("<html><body>");

        let order_id = order.get("id").and_then(|v| v.as_str()).unwrap_or("unknown");
        let _ = write!(markup, "<h1>Order {order_id}</h1>");

        let Some(lines) = order.get("lines").and_then(|v| v.as_array()) else {
            return Err(RenderFailure {
                detail: "order has no line items".to_string(),
                partial_markup: markup,
            });
        };

        markup.push_str("<table>");
        for line in lines {
            let name = line.get("name").and_then(|v| v.as_str()).unwrap_or("?");
            let quantity = line.get("quantity").and_then(|v| v.as_u64()).unwrap_or(0);
            let price = line.get("price").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let _ = write!(
                markup,
                "<tr><td>{name}</td><td>{quantity}</td><td>{price:.2}</td></tr>"
            );
        }
        markup.push_str("</table></body></html>");

        Ok(markup)
    }
}
