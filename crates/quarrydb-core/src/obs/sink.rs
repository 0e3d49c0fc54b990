//! Metrics sink boundary.
//!
//! Core DB logic MUST NOT touch `obs::metrics` directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// PlanKind
///
/// Execution path chosen by the query engine for one query.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanKind {
    Index,
    RemoteKeys,
    FullScan,
}

///
/// MetricsEvent
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    Plan {
        kind: PlanKind,
    },
    DocumentsRead {
        count: u64,
    },
    IndexDelta {
        inserts: u64,
        removes: u64,
    },
    IndexCreated {
        collection_group: String,
    },
    Backfill {
        collection_group: String,
        documents: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default thread-local sink that accumulates into the global counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::Plan { kind } => metrics::with_state_mut(|m| match kind {
                PlanKind::Index => m.ops.plan_index = m.ops.plan_index.saturating_add(1),
                PlanKind::RemoteKeys => {
                    m.ops.plan_remote_keys = m.ops.plan_remote_keys.saturating_add(1);
                }
                PlanKind::FullScan => {
                    m.ops.plan_full_scan = m.ops.plan_full_scan.saturating_add(1);
                }
            }),

            MetricsEvent::DocumentsRead { count } => metrics::with_state_mut(|m| {
                m.ops.documents_read = m.ops.documents_read.saturating_add(count);
            }),

            MetricsEvent::IndexDelta { inserts, removes } => metrics::with_state_mut(|m| {
                m.ops.index_inserts = m.ops.index_inserts.saturating_add(inserts);
                m.ops.index_removes = m.ops.index_removes.saturating_add(removes);
            }),

            MetricsEvent::IndexCreated { .. } => metrics::with_state_mut(|m| {
                m.ops.indexes_created = m.ops.indexes_created.saturating_add(1);
            }),

            MetricsEvent::Backfill {
                collection_group,
                documents,
            } => metrics::with_state_mut(|m| {
                m.ops.backfill_runs = m.ops.backfill_runs.saturating_add(1);
                m.ops.backfill_documents = m.ops.backfill_documents.saturating_add(documents);

                let entry = m.collection_groups.entry(collection_group).or_default();
                entry.backfill_documents = entry.backfill_documents.saturating_add(documents);
                entry.backfill_passes = entry.backfill_passes.saturating_add(1);
            }),
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match override_sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state for endpoint/test plumbing.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
///
/// The previous sink is restored on every exit, including unwinding.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct CaptureSink {
        events: RefCell<Vec<MetricsEvent>>,
    }

    impl MetricsSink for CaptureSink {
        fn record(&self, event: MetricsEvent) {
            self.events.borrow_mut().push(event);
        }
    }

    #[test]
    fn override_captures_and_restores() {
        metrics_reset_all();
        let capture = Rc::new(CaptureSink::default());

        with_metrics_sink(capture.clone(), || {
            record(MetricsEvent::Plan {
                kind: PlanKind::FullScan,
            });
        });
        record(MetricsEvent::Plan {
            kind: PlanKind::Index,
        });

        assert_eq!(
            capture.events.borrow().as_slice(),
            &[MetricsEvent::Plan {
                kind: PlanKind::FullScan
            }]
        );

        let report = metrics_report();
        assert_eq!(report.ops.plan_index, 1);
        assert_eq!(report.ops.plan_full_scan, 0);
    }

    #[test]
    fn backfill_events_accumulate_per_group() {
        metrics_reset_all();

        for documents in [3, 4] {
            record(MetricsEvent::Backfill {
                collection_group: "coll".to_string(),
                documents,
            });
        }

        let report = metrics_report();
        assert_eq!(report.ops.backfill_runs, 2);
        assert_eq!(report.ops.backfill_documents, 7);
        assert_eq!(report.collection_groups["coll"].backfill_passes, 2);
    }
}
