//! Common plumbing for metric declarations.
//!
//! Each crate declares its metrics as [`MetricDef`] consts in its own
//! `metrics_defs` module and the binary registers them all at startup, so
//! every metric name that can be emitted is discoverable in one place.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
}

/// Register metric descriptions with the installed recorder.
pub fn describe(defs: &[MetricDef]) {
    for def in defs {
        match def.kind {
            MetricKind::Counter => metrics::describe_counter!(def.name, def.description),
            MetricKind::Gauge => metrics::describe_gauge!(def.name, def.description),
            MetricKind::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}
