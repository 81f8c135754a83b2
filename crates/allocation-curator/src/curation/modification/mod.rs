//! Bulk edits described by an action object.
//!
//! An action object is validated into a [`ModificationCommand`] and applied to a
//! borrowed [`Dataset`], producing a new one. A rejected command never yields a
//! partially updated collection; the caller keeps its input as-is.

mod matching;

pub(crate) use matching::{matches_filter, strict_eq};

use super::domain::{Dataset, Entity, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{info, warn};

/// Field/value pairs a record must match, compared with strict equality.
pub type RecordFilter = Map<String, Value>;
/// Field/value pairs written over a matched record.
pub type FieldChanges = Map<String, Value>;

const REQUIRED_FIELDS: [&str; 4] = ["entity", "action", "filter", "changes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    UpdateMany,
    UpdateOne,
    DeleteOne,
}

impl ActionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "update_many" => Some(Self::UpdateMany),
            "update_one" => Some(Self::UpdateOne),
            "delete_one" => Some(Self::DeleteOne),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::UpdateMany => "update_many",
            Self::UpdateOne => "update_one",
            Self::DeleteOne => "delete_one",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModificationCommand {
    /// Merge `changes` into every record matching `filter`.
    UpdateMany {
        entity: EntityKind,
        filter: RecordFilter,
        changes: FieldChanges,
    },
    /// Merge `changes` into the first matching record.
    UpdateOne {
        entity: EntityKind,
        filter: RecordFilter,
        changes: FieldChanges,
    },
    /// Remove the first matching record.
    DeleteOne {
        entity: EntityKind,
        filter: RecordFilter,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModificationError {
    #[error("action object must be a JSON object")]
    NotAnObject,
    #[error("action object is missing `{0}`")]
    MissingField(&'static str),
    #[error("action field `{field}` must be {expected}")]
    MalformedField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("`{0}` is not implemented yet; no records were changed")]
    NotImplemented(ActionKind),
    #[error("changes cannot be applied to {entity} record `{id}`: {reason}")]
    IncompatibleChange {
        entity: EntityKind,
        id: String,
        reason: String,
    },
}

fn object_field(
    action: &Map<String, Value>,
    field: &'static str,
) -> Result<Map<String, Value>, ModificationError> {
    match action.get(field) {
        Some(Value::Object(map)) => Ok(map.clone()),
        _ => Err(ModificationError::MalformedField {
            field,
            expected: "an object",
        }),
    }
}

fn string_field<'a>(
    action: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ModificationError> {
    action
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ModificationError::MalformedField {
            field,
            expected: "a string",
        })
}

impl ModificationCommand {
    /// Validates an action object from the modification collaborator.
    pub fn from_action(action: &Value) -> Result<Self, ModificationError> {
        let action = action.as_object().ok_or(ModificationError::NotAnObject)?;

        for field in REQUIRED_FIELDS {
            if action.get(field).map_or(true, Value::is_null) {
                return Err(ModificationError::MissingField(field));
            }
        }

        let entity_name = string_field(action, "entity")?;
        let entity = EntityKind::from_name(entity_name)
            .ok_or_else(|| ModificationError::UnknownEntity(entity_name.to_string()))?;

        let action_name = string_field(action, "action")?;
        let kind = ActionKind::from_name(action_name)
            .ok_or_else(|| ModificationError::UnknownAction(action_name.to_string()))?;

        let filter = object_field(action, "filter")?;
        let changes = object_field(action, "changes")?;

        Ok(match kind {
            ActionKind::UpdateMany => Self::UpdateMany {
                entity,
                filter,
                changes,
            },
            ActionKind::UpdateOne => Self::UpdateOne {
                entity,
                filter,
                changes,
            },
            ActionKind::DeleteOne => Self::DeleteOne { entity, filter },
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::UpdateMany { .. } => ActionKind::UpdateMany,
            Self::UpdateOne { .. } => ActionKind::UpdateOne,
            Self::DeleteOne { .. } => ActionKind::DeleteOne,
        }
    }

    pub fn entity(&self) -> EntityKind {
        match self {
            Self::UpdateMany { entity, .. }
            | Self::UpdateOne { entity, .. }
            | Self::DeleteOne { entity, .. } => *entity,
        }
    }
}

/// Result of a committed command: the new collections plus how many records matched.
#[derive(Debug, Clone, PartialEq)]
pub struct ModificationOutcome {
    pub dataset: Dataset,
    pub entity: EntityKind,
    pub matched: usize,
}

pub fn apply_modification(
    dataset: &Dataset,
    command: &ModificationCommand,
) -> Result<ModificationOutcome, ModificationError> {
    let ModificationCommand::UpdateMany {
        entity,
        filter,
        changes,
    } = command
    else {
        let kind = command.kind();
        warn!(
            action = %kind,
            entity = %command.entity(),
            "modification action not implemented; collection left unchanged"
        );
        return Err(ModificationError::NotImplemented(kind));
    };

    let mut next = dataset.clone();
    let matched = match entity {
        EntityKind::Clients => update_many(&mut next.clients, filter, changes),
        EntityKind::Workers => update_many(&mut next.workers, filter, changes),
        EntityKind::Tasks => update_many(&mut next.tasks, filter, changes),
    }
    .map_err(|err| {
        warn!(entity = %entity, error = %err, "modification rejected");
        err
    })?;

    info!(
        entity = %entity,
        matched,
        records = next.len_of(*entity),
        "update_many applied"
    );

    Ok(ModificationOutcome {
        dataset: next,
        entity: *entity,
        matched,
    })
}

fn to_object<E: Entity>(record: &E) -> Result<Map<String, Value>, ModificationError> {
    let incompatible = |reason: String| ModificationError::IncompatibleChange {
        entity: E::KIND,
        id: record.id().to_string(),
        reason,
    };
    match serde_json::to_value(record).map_err(|err| incompatible(err.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(incompatible(format!("record serialized as {other}"))),
    }
}

/// Rewrites matching records in place. On error the slice may be partially
/// rewritten, so callers must work on a copy.
fn update_many<E: Entity>(
    records: &mut [E],
    filter: &RecordFilter,
    changes: &FieldChanges,
) -> Result<usize, ModificationError> {
    let mut matched = 0;
    for record in records.iter_mut() {
        let mut fields = to_object(record)?;
        if !matches_filter(&fields, filter) {
            continue;
        }

        for (key, value) in changes {
            fields.insert(key.clone(), value.clone());
        }
        let updated = serde_json::from_value(Value::Object(fields)).map_err(|err| {
            ModificationError::IncompatibleChange {
                entity: E::KIND,
                id: record.id().to_string(),
                reason: err.to_string(),
            }
        })?;
        *record = updated;
        matched += 1;
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::domain::{Loose, Worker};
    use crate::curation::fixtures::{clean_dataset, grouped_worker};
    use serde_json::{json, Number};

    fn grouped_dataset() -> Dataset {
        let mut dataset = clean_dataset();
        dataset.workers = vec![
            grouped_worker("W1", "GroupA", 1),
            grouped_worker("W2", "GroupB", 2),
            grouped_worker("W3", "GroupA", 2),
        ];
        dataset
    }

    fn command(action: Value) -> ModificationCommand {
        ModificationCommand::from_action(&action).expect("valid action")
    }

    #[test]
    fn update_many_rewrites_only_matching_records() {
        let dataset = grouped_dataset();
        let outcome = apply_modification(
            &dataset,
            &command(json!({
                "action": "update_many",
                "entity": "workers",
                "filter": { "WorkerGroup": "GroupA" },
                "changes": { "MaxLoadPerPhase": 3 }
            })),
        )
        .expect("applied");

        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.entity, EntityKind::Workers);
        let workers = &outcome.dataset.workers;
        assert_eq!(workers.len(), 3);
        assert_eq!(workers[1], dataset.workers[1]);
        for (index, original) in [(0, &dataset.workers[0]), (2, &dataset.workers[2])] {
            let expected = Worker {
                max_load_per_phase: Loose::Parsed(Number::from(3)),
                ..original.clone()
            };
            assert_eq!(workers[index], expected);
        }
        assert_eq!(outcome.dataset.clients, dataset.clients);
        assert_eq!(outcome.dataset.tasks, dataset.tasks);
    }

    #[test]
    fn filter_on_string_does_not_match_number() {
        let dataset = clean_dataset();
        let outcome = apply_modification(
            &dataset,
            &command(json!({
                "action": "update_many",
                "entity": "clients",
                "filter": { "PriorityLevel": "3" },
                "changes": { "GroupTag": "vip" }
            })),
        )
        .expect("applied");

        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.dataset, dataset);
    }

    #[test]
    fn unknown_change_keys_land_in_extra_columns() {
        let dataset = clean_dataset();
        let outcome = apply_modification(
            &dataset,
            &command(json!({
                "action": "update_many",
                "entity": "tasks",
                "filter": { "TaskID": "T1" },
                "changes": { "Owner": "ops" }
            })),
        )
        .expect("applied");

        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.dataset.tasks[0].extra.get("Owner"), Some(&json!("ops")));
        assert!(outcome.dataset.tasks[1].extra.is_empty());
    }

    #[test]
    fn incompatible_change_rejects_the_whole_command() {
        let dataset = grouped_dataset();
        let err = apply_modification(
            &dataset,
            &command(json!({
                "action": "update_many",
                "entity": "workers",
                "filter": { "WorkerGroup": "GroupA" },
                "changes": { "WorkerName": 42 }
            })),
        )
        .expect_err("WorkerName must stay a string");

        assert!(matches!(
            err,
            ModificationError::IncompatibleChange { entity: EntityKind::Workers, ref id, .. } if id == "W1"
        ));
    }

    #[test]
    fn missing_changes_is_rejected_before_anything_runs() {
        let err = ModificationCommand::from_action(&json!({
            "action": "update_many",
            "entity": "workers",
            "filter": { "WorkerGroup": "GroupA" }
        }))
        .expect_err("changes missing");
        assert_eq!(err, ModificationError::MissingField("changes"));
    }

    #[test]
    fn action_objects_are_checked_field_by_field() {
        let cases = [
            (json!("update everything"), ModificationError::NotAnObject),
            (
                json!({ "action": "update_many", "entity": "projects", "filter": {}, "changes": {} }),
                ModificationError::UnknownEntity("projects".into()),
            ),
            (
                json!({ "action": "upsert", "entity": "tasks", "filter": {}, "changes": {} }),
                ModificationError::UnknownAction("upsert".into()),
            ),
            (
                json!({ "action": "update_many", "entity": "tasks", "filter": "T1", "changes": {} }),
                ModificationError::MalformedField {
                    field: "filter",
                    expected: "an object",
                },
            ),
            (
                json!({ "action": "update_many", "entity": 3, "filter": {}, "changes": {} }),
                ModificationError::MalformedField {
                    field: "entity",
                    expected: "a string",
                },
            ),
        ];

        for (action, expected) in cases {
            assert_eq!(ModificationCommand::from_action(&action), Err(expected));
        }
    }

    #[test]
    fn single_record_actions_are_not_implemented() {
        let dataset = clean_dataset();
        for action in ["update_one", "delete_one"] {
            let parsed = command(json!({
                "action": action,
                "entity": "clients",
                "filter": { "ClientID": "C1" },
                "changes": {}
            }));
            let err = apply_modification(&dataset, &parsed).expect_err("not implemented");
            assert_eq!(err, ModificationError::NotImplemented(parsed.kind()));
        }
    }
}
