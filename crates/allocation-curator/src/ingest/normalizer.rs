use super::parser::RawRow;
use crate::curation::domain::EntityKind;
use serde_json::{Map, Number, Value};

const MAX_PHASE_RANGE: i64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Text,
    OptionalText,
    Number,
    TextList,
    NumberList,
    PhaseList,
    Attributes,
}

fn cell_kind(kind: EntityKind, column: &str) -> Cell {
    match (kind, column) {
        (EntityKind::Clients, "PriorityLevel")
        | (EntityKind::Workers, "MaxLoadPerPhase")
        | (EntityKind::Tasks, "Duration" | "MaxConcurrent") => Cell::Number,
        (EntityKind::Clients, "RequestedTaskIDs")
        | (EntityKind::Workers, "Skills")
        | (EntityKind::Tasks, "RequiredSkills") => Cell::TextList,
        (EntityKind::Workers, "AvailableSlots") => Cell::NumberList,
        (EntityKind::Tasks, "PreferredPhases") => Cell::PhaseList,
        (EntityKind::Clients, "AttributesJSON") => Cell::Attributes,
        (EntityKind::Clients, "ClientID" | "ClientName")
        | (EntityKind::Workers, "WorkerID" | "WorkerName")
        | (EntityKind::Tasks, "TaskID" | "TaskName") => Cell::Text,
        _ => Cell::OptionalText,
    }
}

/// Turns a raw CSV row into the record shape the entity model deserializes.
pub(crate) fn normalize_row(kind: EntityKind, row: RawRow) -> Map<String, Value> {
    let mut fields = Map::new();
    for (column, cell) in row {
        let value = match cell_kind(kind, &column) {
            Cell::Text => Some(Value::String(cell)),
            Cell::OptionalText => (!cell.is_empty()).then(|| Value::String(cell)),
            Cell::Number => Some(number_cell(&cell)),
            Cell::TextList => Some(text_list(&cell)),
            Cell::NumberList => Some(number_list(&cell)),
            Cell::PhaseList => Some(phase_list(&cell)),
            Cell::Attributes => attributes(&cell),
        };
        if let Some(value) = value {
            fields.insert(column, value);
        }
    }
    fields
}

fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(integer) = text.parse::<i64>() {
        return Some(Number::from(integer));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Numeric cells keep non-numeric input as a string so validation can report it.
fn number_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    parse_number(cell).map_or_else(|| Value::String(cell.to_string()), Value::Number)
}

fn text_list(cell: &str) -> Value {
    Value::Array(
        cell.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| Value::String(entry.to_string()))
            .collect(),
    )
}

/// Accepts a JSON array of numbers (`[1,3,5]`) or a comma list (`1,3,5`);
/// entries that are not numbers are dropped.
fn number_list(cell: &str) -> Value {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(cell) {
        if items.iter().all(Value::is_number) {
            return Value::Array(items);
        }
    }
    Value::Array(
        cell.split(',')
            .filter_map(parse_number)
            .map(Value::Number)
            .collect(),
    )
}

/// `a-b` expands to the inclusive range; a malformed or reversed range is empty.
/// JSON arrays and comma lists go through [`number_list`] even when they hold
/// negative numbers, so validation sees those entries.
fn phase_list(cell: &str) -> Value {
    let range = cell
        .split_once('-')
        .filter(|_| !cell.contains(',') && !cell.trim_start().starts_with('['));
    let Some((start, end)) = range else {
        return number_list(cell);
    };
    let bounds = (start.trim().parse::<i64>(), end.trim().parse::<i64>());
    match bounds {
        (Ok(start), Ok(end)) if start <= end && end - start < MAX_PHASE_RANGE => {
            Value::Array((start..=end).map(Value::from).collect())
        }
        _ => Value::Array(Vec::new()),
    }
}

/// Unparseable attribute blobs are dropped, as if the column were empty.
fn attributes(cell: &str) -> Option<Value> {
    if cell.is_empty() {
        return None;
    }
    serde_json::from_str(cell).ok()
}
