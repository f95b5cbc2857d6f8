//! Metrics definitions for the exporter.

use shared::metrics_defs::{MetricDef, MetricKind};

pub const JOBS_SUBMITTED: MetricDef = MetricDef {
    name: "exporter.jobs.submitted",
    kind: MetricKind::Counter,
    description: "Conversion jobs submitted to the provider",
};

pub const JOB_TIMEOUTS: MetricDef = MetricDef {
    name: "exporter.jobs.timed_out",
    kind: MetricKind::Counter,
    description: "Jobs still pending when the poll budget ran out",
};

pub const JOB_POLL_ATTEMPTS: MetricDef = MetricDef {
    name: "exporter.jobs.poll_attempts",
    kind: MetricKind::Histogram,
    description: "Status checks performed per job before a terminal state",
};

pub const ALL_METRICS: &[MetricDef] = &[JOBS_SUBMITTED, JOB_TIMEOUTS, JOB_POLL_ATTEMPTS];
