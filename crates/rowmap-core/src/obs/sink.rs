//! Metrics sink boundary.
//!
//! Engine code never touches `obs::metrics` directly; every counter update
//! flows through a [`MetricsEvent`] handed to [`record`].
use crate::obs::metrics;
use std::{cell::RefCell, sync::Arc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Arc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    TableSynthesized { schema: &'a str },
    SchemaValidated { schema: &'a str },
    MigrationMismatch { schema: &'a str, mismatches: u64 },
    RowCreated { schema: &'a str },
    RowUpdated { schema: &'a str },
    IdentityCacheHit,
    JsonImport { schema: &'a str },
    DetachedCopy { schema: &'a str },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink writing into the thread's metrics state.
/// Used whenever no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::TableSynthesized { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.tables_synthesized = m.ops.tables_synthesized.saturating_add(1);
                });
            }
            MetricsEvent::SchemaValidated { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.schemas_validated = m.ops.schemas_validated.saturating_add(1);
                });
            }
            MetricsEvent::MigrationMismatch { schema, mismatches } => metrics::bump(
                schema,
                mismatches,
                |o| &mut o.migration_mismatches,
                |s| &mut s.migration_mismatches,
            ),
            MetricsEvent::RowCreated { schema } => {
                metrics::bump(schema, 1, |o| &mut o.rows_created, |s| &mut s.rows_created);
            }
            MetricsEvent::RowUpdated { schema } => {
                metrics::bump(schema, 1, |o| &mut o.rows_updated, |s| &mut s.rows_updated);
            }
            MetricsEvent::IdentityCacheHit => {
                metrics::with_state_mut(|m| {
                    m.ops.identity_cache_hits = m.ops.identity_cache_hits.saturating_add(1);
                });
            }
            MetricsEvent::JsonImport { schema } => {
                metrics::bump(schema, 1, |o| &mut o.json_imports, |s| &mut s.json_imports);
            }
            MetricsEvent::DetachedCopy { schema } => metrics::bump(
                schema,
                1,
                |o| &mut o.detached_objects,
                |s| &mut s.detached_objects,
            ),
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Run a closure with a temporary metrics sink override.
///
/// The previous sink is restored when `f` returns or unwinds.
pub fn with_metrics_sink<T>(sink: Arc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Arc<dyn MetricsSink>>);

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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<String>>);

    impl MetricsSink for Capture {
        fn record(&self, event: MetricsEvent<'_>) {
            if let Ok(mut events) = self.0.lock() {
                events.push(format!("{event:?}"));
            }
        }
    }

    #[test]
    fn global_sink_counts_per_schema() {
        metrics::reset();
        record(MetricsEvent::RowCreated { schema: "Person" });
        record(MetricsEvent::RowCreated { schema: "Person" });
        record(MetricsEvent::RowUpdated { schema: "Dog" });

        let state = metrics::snapshot();
        assert_eq!(state.ops.rows_created, 2);
        assert_eq!(state.schemas["Person"].rows_created, 2);
        assert_eq!(state.schemas["Dog"].rows_updated, 1);
    }

    #[test]
    fn override_is_scoped() {
        metrics::reset();
        let capture = Arc::new(Capture::default());

        with_metrics_sink(capture.clone(), || {
            record(MetricsEvent::IdentityCacheHit);
        });
        record(MetricsEvent::IdentityCacheHit);

        let captured = capture.0.lock().map(|v| v.len()).unwrap_or_default();
        assert_eq!(captured, 1, "only the scoped event reaches the override");
        assert_eq!(metrics::snapshot().ops.identity_cache_hits, 1);
    }
}
