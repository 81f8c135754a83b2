use crate::curation::domain::number_value;
use serde_json::{Map, Value};

/// Strict equality between a record value and a filter value.
///
/// No coercion across types: `"3"` never equals `3`. Numbers compare by value
/// so `3` equals `3.0`. Arrays and objects never match, even structurally
/// identical ones.
pub(crate) fn strict_eq(record: &Value, filter: &Value) -> bool {
    match (record, filter) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Number(left), Value::Number(right)) => {
            match (number_value(left), number_value(right)) {
                (Some(left), Some(right)) => left == right,
                _ => false,
            }
        }
        _ => false,
    }
}

/// Every filter pair must hold. An absent field never matches, an empty filter always does.
pub(crate) fn matches_filter(record: &Map<String, Value>, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(key, expected)| {
        record
            .get(key)
            .is_some_and(|actual| strict_eq(actual, expected))
    })
}
