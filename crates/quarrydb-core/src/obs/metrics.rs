use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for engine operations.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
    pub(crate) collection_groups: BTreeMap<String, GroupCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Read paths
    pub plan_index: u64,
    pub plan_remote_keys: u64,
    pub plan_full_scan: u64,
    pub documents_read: u64,

    // Index maintenance
    pub index_inserts: u64,
    pub index_removes: u64,
    pub indexes_created: u64,

    // Background work
    pub backfill_runs: u64,
    pub backfill_documents: u64,
}

///
/// GroupCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GroupCounters {
    pub backfill_documents: u64,
    pub backfill_passes: u64,
}

///
/// EventReport
/// Point-in-time snapshot of the counters, safe to hand to callers.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub collection_groups: BTreeMap<String, GroupCounters>,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

#[must_use]
pub(crate) fn report() -> EventReport {
    with_state(|m| EventReport {
        ops: m.ops.clone(),
        collection_groups: m.collection_groups.clone(),
    })
}
