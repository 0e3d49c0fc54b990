use crate::{model::path::FieldPath, value::Value};
use derive_more::{Deref, From};
use std::collections::BTreeMap;

///
/// ObjectValue
///
/// Top-level field map of a document, addressed by dotted [`FieldPath`]s.
///

#[derive(Clone, Debug, Default, Deref, Eq, From, PartialEq)]
pub struct ObjectValue(BTreeMap<String, Value>);

impl ObjectValue {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Value at `path`, descending through nested maps.
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.0.get(first)?;

        for segment in rest {
            match current {
                Value::Map(fields) => current = fields.get(segment)?,
                _ => return None,
            }
        }

        Some(current)
    }

    /// Write `value` at `path`, replacing non-map intermediates with maps.
    pub fn set(&mut self, path: &FieldPath, value: Value) {
        let Some((last, parents)) = path.segments().split_last() else {
            return;
        };

        let mut fields = &mut self.0;
        for segment in parents {
            let slot = fields
                .entry(segment.clone())
                .or_insert_with(|| Value::Map(BTreeMap::new()));
            if !matches!(slot, Value::Map(_)) {
                *slot = Value::Map(BTreeMap::new());
            }
            let Value::Map(child) = slot else {
                return;
            };
            fields = child;
        }

        fields.insert(last.clone(), value);
    }

    /// Remove the value at `path`; missing intermediates are a no-op.
    pub fn delete(&mut self, path: &FieldPath) {
        let Some((last, parents)) = path.segments().split_last() else {
            return;
        };

        let mut fields = &mut self.0;
        for segment in parents {
            match fields.get_mut(segment) {
                Some(Value::Map(child)) => fields = child,
                _ => return,
            }
        }

        fields.remove(last);
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Map(self.0)
    }
}
