//! Metrics definitions for the catalog.

use shared::metrics_defs::{MetricDef, MetricKind};

pub const ITEMS_OK: MetricDef = MetricDef {
    name: "catalog.batch.items_ok",
    kind: MetricKind::Counter,
    description: "Batch items applied successfully, tagged by operation",
};

pub const ITEMS_FAILED: MetricDef = MetricDef {
    name: "catalog.batch.items_failed",
    kind: MetricKind::Counter,
    description: "Batch items rejected or failed by the store, tagged by operation",
};

pub const THROTTLE_PAUSES: MetricDef = MetricDef {
    name: "catalog.batch.throttle_pauses",
    kind: MetricKind::Counter,
    description: "Pauses inserted by the delete-path throttle",
};

pub const ALL_METRICS: &[MetricDef] = &[ITEMS_OK, ITEMS_FAILED, THROTTLE_PAUSES];
