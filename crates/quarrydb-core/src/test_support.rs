//! Shared fixtures for unit tests.

use crate::{
    db::query::{Filter, Operator, Query},
    model::{
        document::{Document, SnapshotVersion},
        key::DocumentKey,
        mutation::{Mutation, Overlay},
        object::ObjectValue,
        path::{FieldPath, ResourcePath},
    },
    obs::{MetricsEvent, MetricsSink, with_metrics_sink},
    value::Value,
};
use std::{cell::RefCell, rc::Rc};

pub(crate) fn key(path: &str) -> DocumentKey {
    DocumentKey::parse(path).expect("test key should be a document path")
}

pub(crate) fn version(micros: i64) -> SnapshotVersion {
    SnapshotVersion::from_micros(micros)
}

pub(crate) fn object(entries: &[(&str, Value)]) -> ObjectValue {
    let mut data = ObjectValue::new();
    for (field, value) in entries {
        data.set(&FieldPath::from_dotted(field), value.clone());
    }

    data
}

/// Synced document at `path`, written at `micros` with the same read time.
pub(crate) fn doc(path: &str, micros: i64, entries: &[(&str, Value)]) -> Document {
    Document::found(key(path), version(micros), object(entries)).with_read_time(version(micros))
}

pub(crate) fn deleted_doc(path: &str, micros: i64) -> Document {
    Document::no_document(key(path), version(micros)).with_read_time(version(micros))
}

pub(crate) fn query(path: &str) -> Query {
    Query::at_path(ResourcePath::parse(path))
}

pub(crate) fn filter(field: &str, op: &str, value: impl Into<Value>) -> Filter {
    let op = match op {
        "<" => Operator::LessThan,
        "<=" => Operator::LessThanOrEqual,
        "==" => Operator::Equal,
        "!=" => Operator::NotEqual,
        ">=" => Operator::GreaterThanOrEqual,
        ">" => Operator::GreaterThan,
        "array-contains" => Operator::ArrayContains,
        "array-contains-any" => Operator::ArrayContainsAny,
        "in" => Operator::In,
        "not-in" => Operator::NotIn,
        other => panic!("unknown operator '{other}'"),
    };

    Filter::field(field, op, value)
}

pub(crate) fn array(values: &[i64]) -> Value {
    Value::Array(values.iter().copied().map(Value::Integer).collect())
}

pub(crate) fn set_overlay(batch_id: i32, path: &str, entries: &[(&str, Value)]) -> Overlay {
    Overlay::new(
        batch_id,
        Mutation::Set {
            key: key(path),
            value: object(entries),
        },
    )
}

pub(crate) fn delete_overlay(batch_id: i32, path: &str) -> Overlay {
    Overlay::new(batch_id, Mutation::Delete { key: key(path) })
}

///
/// CaptureSink
///
/// Metrics sink that keeps every event for inspection.
///

#[derive(Default)]
pub(crate) struct CaptureSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// Run `f` with a capturing sink installed and return its result together
/// with the events it recorded.
pub(crate) fn capture_events<T>(f: impl FnOnce() -> T) -> (T, Vec<MetricsEvent>) {
    let sink = Rc::new(CaptureSink::default());
    let result = with_metrics_sink(sink.clone(), f);
    let events = sink.events.take();

    (result, events)
}
