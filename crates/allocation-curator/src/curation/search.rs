//! Structured record filters produced by the search collaborator.

use super::domain::{number_value, Entity};
use super::modification::strict_eq;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<=")]
    AtMost,
    #[serde(rename = "includes")]
    Includes,
    #[serde(rename = "excludes")]
    Excludes,
}

impl FilterOperator {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::AtLeast => ">=",
            Self::AtMost => "<=",
            Self::Includes => "includes",
            Self::Excludes => "excludes",
        }
    }
}

impl FromStr for FilterOperator {
    type Err = SearchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "=" => Ok(Self::Equals),
            ">" => Ok(Self::GreaterThan),
            "<" => Ok(Self::LessThan),
            ">=" => Ok(Self::AtLeast),
            "<=" => Ok(Self::AtMost),
            "includes" => Ok(Self::Includes),
            "excludes" => Ok(Self::Excludes),
            other => Err(SearchError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error("search response must be an object with a `filters` array")]
    MalformedResponse,
    #[error("filter {index} is malformed: {reason}")]
    MalformedFilter { index: usize, reason: &'static str },
    #[error("unknown filter operator `{0}`")]
    UnknownOperator(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
}

impl SearchFilter {
    /// Reads `{ "filters": [...] }`. A missing or null list means no filters.
    pub fn parse_all(response: &Value) -> Result<Vec<Self>, SearchError> {
        let object = response.as_object().ok_or(SearchError::MalformedResponse)?;
        let entries = match object.get("filters") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(SearchError::MalformedResponse),
        };

        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let field = entry
                    .get("field")
                    .and_then(Value::as_str)
                    .filter(|field| !field.is_empty())
                    .ok_or(SearchError::MalformedFilter {
                        index,
                        reason: "`field` must be a non-empty string",
                    })?;
                let operator = entry
                    .get("operator")
                    .and_then(Value::as_str)
                    .ok_or(SearchError::MalformedFilter {
                        index,
                        reason: "`operator` must be a string",
                    })?
                    .parse::<FilterOperator>()?;
                Ok(Self {
                    field: field.to_string(),
                    operator,
                    value: entry.get("value").cloned().unwrap_or(Value::Null),
                })
            })
            .collect()
    }

    /// Whether a single field value satisfies this filter. Missing and null never match.
    pub fn accepts(&self, actual: Option<&Value>) -> bool {
        let Some(actual) = actual.filter(|value| !value.is_null()) else {
            return false;
        };

        match self.operator {
            FilterOperator::Equals => strict_eq(actual, &self.value),
            FilterOperator::GreaterThan => compare(actual, &self.value, |a, b| a > b),
            FilterOperator::LessThan => compare(actual, &self.value, |a, b| a < b),
            FilterOperator::AtLeast => compare(actual, &self.value, |a, b| a >= b),
            FilterOperator::AtMost => compare(actual, &self.value, |a, b| a <= b),
            FilterOperator::Includes => contains(actual, &self.value),
            FilterOperator::Excludes => !contains(actual, &self.value),
        }
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number_value(number),
        Value::String(text) if text.trim().is_empty() => Some(0.0),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn compare(actual: &Value, expected: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (coerce_number(actual), coerce_number(expected)) {
        (Some(actual), Some(expected)) => op(actual, expected),
        _ => false,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| strict_eq(item, expected)),
        other => as_text(other).contains(&as_text(expected)),
    }
}

/// Records for which every filter holds, in input order.
pub fn filter_records<E: Entity>(records: &[E], filters: &[SearchFilter]) -> Vec<E> {
    records
        .iter()
        .filter(|record| {
            let Ok(Value::Object(fields)) = serde_json::to_value(record) else {
                return false;
            };
            filters
                .iter()
                .all(|filter| filter.accepts(fields.get(&filter.field)))
        })
        .cloned()
        .collect()
}
