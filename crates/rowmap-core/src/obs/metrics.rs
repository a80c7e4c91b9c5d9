use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// MetricsState
/// Ephemeral, in-memory counters for mapping operations.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MetricsState {
    pub ops: OpCounters,
    pub schemas: BTreeMap<String, SchemaCounters>,
}

///
/// OpCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OpCounters {
    // Schema open
    pub tables_synthesized: u64,
    pub schemas_validated: u64,
    pub migration_mismatches: u64,

    // Graph copies
    pub rows_created: u64,
    pub rows_updated: u64,
    pub identity_cache_hits: u64,
    pub json_imports: u64,
    pub detached_objects: u64,
}

///
/// SchemaCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SchemaCounters {
    pub rows_created: u64,
    pub rows_updated: u64,
    pub json_imports: u64,
    pub detached_objects: u64,
    pub migration_mismatches: u64,
}

thread_local! {
    static METRICS_STATE: RefCell<MetricsState> = RefCell::new(MetricsState::default());
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut MetricsState) -> R) -> R {
    METRICS_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Copy of the calling thread's counters.
#[must_use]
pub fn snapshot() -> MetricsState {
    METRICS_STATE.with(|m| m.borrow().clone())
}

/// Reset all counters (useful in tests).
pub fn reset() {
    with_state_mut(|m| *m = MetricsState::default());
}

/// Increment one counter and the same counter for `schema`.
pub(crate) fn bump(
    schema: &str,
    by: u64,
    op: impl Fn(&mut OpCounters) -> &mut u64,
    per_schema: impl Fn(&mut SchemaCounters) -> &mut u64,
) {
    with_state_mut(|m| {
        let total = op(&mut m.ops);
        *total = total.saturating_add(by);

        let entry = m.schemas.entry(schema.to_string()).or_default();
        let count = per_schema(entry);
        *count = count.saturating_add(by);
    });
}
