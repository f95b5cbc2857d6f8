//! HTTP surface: export and batch endpoints wiring the library crates
//! together behind the shared response envelope.

use crate::auth::require_bearer;
use crate::config::Listener;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use catalog::executor::{BatchExecutor, BatchItem};
use exporter::chain::{DocumentChain, MarkupRenderer, PolledConverter};
use exporter::client::RenderApiClient;
use exporter::errors::ExportError;
use exporter::job::RenderRequest;
use exporter::transport;
use serde::Deserialize;
use shared::envelope::Envelope;
use shared::notify::{self, Channel, Notification, Notifier};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum ApiServeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Handler-level failures, mapped to status codes in `IntoResponse`.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("missing or malformed credentials")]
    Unauthenticated,

    #[error("credentials rejected")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // Provider and orchestration failures are the platform's
            // problem, not the caller's.
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(Envelope::failure(self.to_string()))).into_response()
    }
}

pub struct AppState {
    pub api_key: String,
    pub renderer: Arc<dyn MarkupRenderer>,
    pub chain: DocumentChain,
    /// Present only in polled provider mode; backs the `debug=true` trace.
    pub traced: Option<Arc<PolledConverter<RenderApiClient>>>,
    pub executor: BatchExecutor,
    pub notifiers: Vec<Box<dyn Notifier>>,
    pub notify_recipient: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/export/order", post(export_order))
        .route("/catalog/batch-update", post(batch_update))
        .route("/catalog/batch-delete", post(batch_delete))
        .with_state(state)
}

pub async fn serve(listener: &Listener, state: Arc<AppState>) -> Result<(), ApiServeError> {
    let app = router(state);
    let addr = format!("{}:{}", listener.host, listener.port);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "pantry api listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<Envelope> {
    Json(Envelope::ok())
}

#[derive(Deserialize, Debug)]
struct ExportParams {
    filename: Option<String>,
    #[serde(default)]
    debug: bool,
}

async fn export_order(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportParams>,
    headers: HeaderMap,
    Json(order): Json<serde_json::Value>,
) -> Result<Json<Envelope>, ApiError> {
    require_bearer(&headers, &state.api_key)?;

    let filename = params
        .filename
        .unwrap_or_else(|| "order.pdf".to_string());

    if params.debug {
        return export_order_traced(&state, &order, &filename).await;
    }

    let artifact = state.chain.generate(&order, &filename).await?;

    let mut envelope = Envelope::ok()
        .with_field("filename", &filename)
        .with_field("size_bytes", artifact.size_bytes)
        .with_field("document", transport::encode_artifact(&artifact));

    // Notification delivery is downgraded, never fatal: the document is
    // already generated and must reach the caller either way.
    if let Some(recipient) = &state.notify_recipient
        && !state.notifiers.is_empty()
    {
        let notification = Notification {
            channel: Channel::Email,
            to: recipient.clone(),
            subject: Some("Your order export".to_string()),
            body: format!("{filename} is ready ({} bytes)", artifact.size_bytes),
        };

        let report = notify::dispatch_all(&state.notifiers, &notification).await;
        if !report.is_clean() {
            envelope = envelope
                .with_field("notifications", &report)
                .downgrade("notification delivery failed");
        }
    }

    Ok(Json(envelope))
}

/// Diagnostic shape for troubleshooting the polled provider: the poll
/// outcome is reported in the body instead of raised.
async fn export_order_traced(
    state: &AppState,
    order: &serde_json::Value,
    filename: &str,
) -> Result<Json<Envelope>, ApiError> {
    let Some(traced) = &state.traced else {
        return Err(ApiError::BadRequest(
            "debug traces require the polled provider mode".to_string(),
        ));
    };

    let markup = state
        .renderer
        .render(order)
        .await
        .map_err(|failure| ExportError::UpstreamRender {
            detail: failure.detail,
            markup: failure.partial_markup,
        })?;

    let trace = traced
        .convert_traced(&RenderRequest::new(markup, filename))
        .await?;

    let succeeded = trace.succeeded;
    let error = trace.error.clone();
    let envelope = Envelope::ok().with_field("trace", &trace);

    Ok(Json(if succeeded {
        envelope
    } else {
        envelope.downgrade(error.unwrap_or_else(|| "generation did not succeed".to_string()))
    }))
}

async fn batch_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Envelope>, ApiError> {
    require_bearer(&headers, &state.api_key)?;

    let items = parse_batch_items(&body)?;
    let report = state.executor.apply_updates(&items).await;

    Ok(Json(report_envelope(report)))
}

async fn batch_delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Envelope>, ApiError> {
    require_bearer(&headers, &state.api_key)?;

    let ids = parse_delete_ids(&body)?;
    let report = state.executor.apply_deletes(&ids).await;

    Ok(Json(report_envelope(report)))
}

/// Batch endpoints answer 200 whatever the per-item outcomes were; only a
/// body that is not a batch at all is a caller error.
fn parse_batch_items(body: &serde_json::Value) -> Result<Vec<BatchItem>, ApiError> {
    if !body.is_array() {
        return Err(ApiError::BadRequest(
            "request body must be an array of items".to_string(),
        ));
    }

    serde_json::from_value(body.clone())
        .map_err(|e| ApiError::BadRequest(format!("malformed batch item: {e}")))
}

fn parse_delete_ids(body: &serde_json::Value) -> Result<Vec<String>, ApiError> {
    if !body.is_array() {
        return Err(ApiError::BadRequest(
            "request body must be an array of ids".to_string(),
        ));
    }

    serde_json::from_value(body.clone())
        .map_err(|e| ApiError::BadRequest(format!("malformed id list: {e}")))
}

fn report_envelope(report: catalog::executor::BatchReport) -> Envelope {
    Envelope::ok()
        .with_field("summary", report.summary())
        .with_field("success_count", report.success_count)
        .with_field("failure_count", report.failure_count)
        .with_field("outcomes", &report.outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_array_batch_bodies_are_rejected() {
        let err = parse_batch_items(&json!({"id": "p1"})).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = parse_delete_ids(&json!("p1")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn batch_items_tolerate_missing_fields() {
        // Malformed items parse into the executor's validation path rather
        // than failing the whole request.
        let items = parse_batch_items(&json!([
            {"id": "p1", "data": {"price": 9}},
            {"id": ""},
            {},
        ]))
        .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, "p1");
        assert!(items[1].data.is_null());
        assert!(items[2].id.is_empty());
    }

    #[test]
    fn delete_ids_parse_as_strings() {
        let ids = parse_delete_ids(&json!(["p1", "", "p3"])).unwrap();
        assert_eq!(ids, vec!["p1", "", "p3"]);

        assert!(parse_delete_ids(&json!([1, 2])).is_err());
    }
}
