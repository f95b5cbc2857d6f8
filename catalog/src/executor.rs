//! Sequential batch mutation with per-item failure isolation.
//!
//! Mutations run strictly in input order, one at a time. That is a load
//! bound on the remote store, not a performance oversight: the managed
//! backend rate-limits bursts, and a failed item must never take its
//! siblings down with it.

use crate::errors::{INVALID_FORMAT, StoreError};
use crate::metrics_defs;
use crate::store::EntityStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// One requested mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub id: String,

    /// Partial update payload. `Null` marks an absent payload, which is
    /// invalid for updates.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Per-item result, in the same position as the input item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate batch result. Built incrementally, immutable once returned.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    fn record_success(&mut self, id: &str) {
        self.success_count += 1;
        self.outcomes.push(ItemOutcome {
            id: id.to_string(),
            success: true,
            error: None,
        });
    }

    fn record_failure(&mut self, id: &str, error: &str) {
        self.failure_count += 1;
        self.outcomes.push(ItemOutcome {
            id: id.to_string(),
            success: false,
            error: Some(error.to_string()),
        });
    }

    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed",
            self.success_count, self.failure_count
        )
    }
}

/// Pause inserted after every `every`th successful mutation.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct Throttle {
    pub every: u32,
    pub pause_millis: u64,
}

impl Default for Throttle {
    // Matches the observed provider rate limit on sequential deletes.
    fn default() -> Self {
        Throttle {
            every: 10,
            pause_millis: 100,
        }
    }
}

/// Applies batches of mutations to one collection of the entity store.
pub struct BatchExecutor {
    store: Arc<dyn EntityStore>,
    collection: String,
    delete_throttle: Option<Throttle>,
}

impl BatchExecutor {
    pub fn new(store: Arc<dyn EntityStore>, collection: &str) -> Self {
        BatchExecutor {
            store,
            collection: collection.to_string(),
            delete_throttle: Some(Throttle::default()),
        }
    }

    /// Overrides the delete-path throttle. `None` disables pausing.
    pub fn with_delete_throttle(mut self, throttle: Option<Throttle>) -> Self {
        self.delete_throttle = throttle;
        self
    }

    /// Applies partial updates sequentially, in input order.
    ///
    /// Items missing an id or a payload are recorded as failures and never
    /// sent to the store. A store error is captured into that item's
    /// outcome and execution continues; the batch never aborts early.
    /// Updates carry no built-in pause; the store's own concurrency
    /// tolerance covers this path.
    pub async fn apply_updates(&self, items: &[BatchItem]) -> BatchReport {
        let mut report = BatchReport::default();

        for item in items {
            if item.id.is_empty() || item.data.is_null() {
                report.record_failure(&item.id, INVALID_FORMAT);
                continue;
            }

            match self.store.update(&self.collection, &item.id, &item.data).await {
                Ok(()) => report.record_success(&item.id),
                Err(e) => {
                    tracing::warn!(id = %item.id, error = %e, "batch update item failed");
                    report.record_failure(&item.id, &e.to_string());
                }
            }
        }

        self.finish(report, "update")
    }

    /// Deletes entities sequentially, in input order.
    ///
    /// Same isolation contract as [`Self::apply_updates`], plus the
    /// delete-path throttle: after every `every`th *successful* delete the
    /// loop pauses, since long delete runs are what trips the store's rate
    /// limit. Failed deletes do not advance the throttle counter.
    pub async fn apply_deletes(&self, ids: &[String]) -> BatchReport {
        let mut report = BatchReport::default();

        for id in ids {
            if id.is_empty() {
                report.record_failure(id, INVALID_FORMAT);
                continue;
            }

            match self.store.delete(&self.collection, id).await {
                Ok(()) => {
                    report.record_success(id);

                    if let Some(throttle) = self.delete_throttle
                        && report.success_count % throttle.every as usize == 0
                    {
                        metrics::counter!(metrics_defs::THROTTLE_PAUSES.name).increment(1);
                        sleep(Duration::from_millis(throttle.pause_millis)).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "batch delete item failed");
                    report.record_failure(id, &e.to_string());
                }
            }
        }

        self.finish(report, "delete")
    }

    fn finish(&self, report: BatchReport, operation: &'static str) -> BatchReport {
        metrics::counter!(metrics_defs::ITEMS_OK.name, "operation" => operation)
            .increment(report.success_count as u64);
        metrics::counter!(metrics_defs::ITEMS_FAILED.name, "operation" => operation)
            .increment(report.failure_count as u64);
        tracing::debug!(
            operation,
            collection = %self.collection,
            summary = %report.summary(),
            "batch finished"
        );
        report
    }
}
