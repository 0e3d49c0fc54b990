//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Engine code emits `MetricsEvent`s through `sink::record`; structured
//! diagnostic logging goes through `tracing` at the call sites.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, GroupCounters};
pub use sink::{
    MetricsEvent, MetricsSink, PlanKind, metrics_report, metrics_reset_all, with_metrics_sink,
};
