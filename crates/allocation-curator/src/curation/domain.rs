use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A column value as delivered by the ingestion boundary: either the shape the
/// model expects, or whatever raw value arrived in its place.
///
/// Deserialization tries `T` first and falls back to the raw JSON value, so a
/// malformed cell never fails a whole import. The validation pass reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Loose<T> {
    Parsed(T),
    Raw(Value),
}

impl<T> Loose<T> {
    pub fn missing() -> Self {
        Loose::Raw(Value::Null)
    }

    pub fn parsed(&self) -> Option<&T> {
        match self {
            Loose::Parsed(value) => Some(value),
            Loose::Raw(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Loose::Parsed(_))
    }
}

impl<T> Default for Loose<T> {
    fn default() -> Self {
        Self::missing()
    }
}

impl<T> From<T> for Loose<T> {
    fn from(value: T) -> Self {
        Loose::Parsed(value)
    }
}

impl<T> Loose<Vec<T>> {
    /// Entry count when the value is a list, parsed or raw.
    pub fn list_len(&self) -> Option<usize> {
        match self {
            Loose::Parsed(items) => Some(items.len()),
            Loose::Raw(Value::Array(items)) => Some(items.len()),
            Loose::Raw(_) => None,
        }
    }
}

/// Text columns accept any JSON value. Falsy scalars read as empty, so the
/// validation pass reports them as missing instead of the record failing to load.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(number) if number.as_f64() == Some(0.0) => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

pub(crate) fn number_value(number: &Number) -> Option<f64> {
    number.as_f64()
}

pub(crate) fn is_integral(number: &Number) -> bool {
    number.is_i64()
        || number.is_u64()
        || number_value(number).is_some_and(|value| value.is_finite() && value.fract() == 0.0)
}

/// The three entity collections the curation engine reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Clients,
    Workers,
    Tasks,
}

impl EntityKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::Clients, Self::Workers, Self::Tasks]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "clients" => Some(Self::Clients),
            "workers" => Some(Self::Workers),
            "tasks" => Some(Self::Tasks),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Workers => "workers",
            Self::Tasks => "tasks",
        }
    }

    pub const fn singular(self) -> &'static str {
        match self {
            Self::Clients => "Client",
            Self::Workers => "Worker",
            Self::Tasks => "Task",
        }
    }

    pub const fn id_column(self) -> &'static str {
        match self {
            Self::Clients => "ClientID",
            Self::Workers => "WorkerID",
            Self::Tasks => "TaskID",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row-shaped record with a unique ID column.
pub trait Entity: Serialize + DeserializeOwned + Clone + fmt::Debug {
    const KIND: EntityKind;
    /// Wire column names in display/export order.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(rename = "ClientID", default, deserialize_with = "lenient_text")]
    pub client_id: String,
    #[serde(rename = "ClientName", default, deserialize_with = "lenient_text")]
    pub client_name: String,
    #[serde(rename = "PriorityLevel", default)]
    pub priority_level: Loose<Number>,
    #[serde(rename = "RequestedTaskIDs", default)]
    pub requested_task_ids: Loose<Vec<String>>,
    #[serde(rename = "GroupTag", default, skip_serializing_if = "Option::is_none")]
    pub group_tag: Option<String>,
    #[serde(
        rename = "AttributesJSON",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attributes: Option<Loose<Map<String, Value>>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Entity for Client {
    const KIND: EntityKind = EntityKind::Clients;
    const COLUMNS: &'static [&'static str] = &[
        "ClientID",
        "ClientName",
        "PriorityLevel",
        "RequestedTaskIDs",
        "GroupTag",
        "AttributesJSON",
    ];

    fn id(&self) -> &str {
        &self.client_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    #[serde(rename = "WorkerID", default, deserialize_with = "lenient_text")]
    pub worker_id: String,
    #[serde(rename = "WorkerName", default, deserialize_with = "lenient_text")]
    pub worker_name: String,
    #[serde(rename = "Skills", default)]
    pub skills: Loose<Vec<String>>,
    #[serde(rename = "AvailableSlots", default)]
    pub available_slots: Loose<Vec<Number>>,
    #[serde(rename = "MaxLoadPerPhase", default)]
    pub max_load_per_phase: Loose<Number>,
    #[serde(rename = "WorkerGroup", default, skip_serializing_if = "Option::is_none")]
    pub worker_group: Option<String>,
    #[serde(
        rename = "QualificationLevel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub qualification_level: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Entity for Worker {
    const KIND: EntityKind = EntityKind::Workers;
    const COLUMNS: &'static [&'static str] = &[
        "WorkerID",
        "WorkerName",
        "Skills",
        "AvailableSlots",
        "MaxLoadPerPhase",
        "WorkerGroup",
        "QualificationLevel",
    ];

    fn id(&self) -> &str {
        &self.worker_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "TaskID", default, deserialize_with = "lenient_text")]
    pub task_id: String,
    #[serde(rename = "TaskName", default, deserialize_with = "lenient_text")]
    pub task_name: String,
    #[serde(rename = "Category", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "Duration", default)]
    pub duration: Loose<Number>,
    #[serde(rename = "RequiredSkills", default)]
    pub required_skills: Loose<Vec<String>>,
    #[serde(rename = "PreferredPhases", default)]
    pub preferred_phases: Loose<Vec<Number>>,
    #[serde(rename = "MaxConcurrent", default)]
    pub max_concurrent: Loose<Number>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Tasks;
    const COLUMNS: &'static [&'static str] = &[
        "TaskID",
        "TaskName",
        "Category",
        "Duration",
        "RequiredSkills",
        "PreferredPhases",
        "MaxConcurrent",
    ];

    fn id(&self) -> &str {
        &self.task_id
    }
}

/// Snapshot of all three collections, handed to the engines by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub workers: Vec<Worker>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Dataset {
    pub fn len_of(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Clients => self.clients.len(),
            EntityKind::Workers => self.workers.len(),
            EntityKind::Tasks => self.tasks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty() && self.workers.is_empty() && self.tasks.is_empty()
    }
}
