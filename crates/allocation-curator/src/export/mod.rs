//! Serialization of curated collections and the rules configuration.
//!
//! CSV output flattens list cells to `", "`-joined text and object cells to
//! JSON text. JSON output keeps the wire shape, so it can be imported again.

use crate::curation::domain::{Dataset, Entity, EntityKind};
use crate::curation::rules::RulesConfig;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::info;

pub const RULES_FILE_NAME: &str = "rules.json";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no {0} to export")]
    EmptyCollection(EntityKind),
    #[error("unsupported export format `{0}` (expected csv or json)")]
    UnsupportedFormat(String),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to flush export buffer: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A rendered export, ready to be written to disk or returned as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

pub fn export_collection<E: Entity>(
    records: &[E],
    format: ExportFormat,
) -> Result<ExportDocument, ExportError> {
    if records.is_empty() {
        return Err(ExportError::EmptyCollection(E::KIND));
    }

    let body = match format {
        ExportFormat::Csv => write_csv(records)?,
        ExportFormat::Json => serde_json::to_vec_pretty(records)?,
    };

    info!(
        entity = %E::KIND,
        rows = records.len(),
        %format,
        bytes = body.len(),
        "collection exported"
    );

    Ok(ExportDocument {
        file_name: format!("{}.{}", E::KIND, format.extension()),
        content_type: format.content_type(),
        body,
    })
}

pub fn export_dataset(
    dataset: &Dataset,
    entity: EntityKind,
    format: ExportFormat,
) -> Result<ExportDocument, ExportError> {
    match entity {
        EntityKind::Clients => export_collection(&dataset.clients, format),
        EntityKind::Workers => export_collection(&dataset.workers, format),
        EntityKind::Tasks => export_collection(&dataset.tasks, format),
    }
}

/// Pretty-printed `{ rules, priorities }` document.
pub fn rules_config_json(config: &RulesConfig) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(config)?)
}

fn write_csv<E: Entity>(records: &[E]) -> Result<Vec<u8>, ExportError> {
    let rows = records
        .iter()
        .map(|record| match serde_json::to_value(record)? {
            Value::Object(fields) => Ok(fields),
            _ => Ok(Map::new()),
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    let extra: BTreeSet<&str> = rows
        .iter()
        .flat_map(|fields| fields.keys())
        .map(String::as_str)
        .filter(|column| !E::COLUMNS.contains(column))
        .collect();
    let columns: Vec<&str> = E::COLUMNS.iter().copied().chain(extra).collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for fields in &rows {
        writer.write_record(columns.iter().map(|column| flatten_cell(fields.get(*column))))?;
    }

    writer.into_inner().map_err(|err| ExportError::Io(err.into_error()))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn flatten_cell(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        Some(object @ Value::Object(_)) => object.to_string(),
        Some(other) => scalar_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::domain::{Client, Loose, Task, Worker};
    use crate::curation::rules::{BusinessRule, PriorityWeights, RuleBook};
    use serde_json::{json, Number};

    fn client_with_attributes() -> Client {
        let mut attributes = Map::new();
        attributes.insert("tier".into(), json!("gold"));
        Client {
            client_id: "C1".into(),
            client_name: "Acme, Inc".into(),
            priority_level: Loose::Parsed(Number::from(2)),
            requested_task_ids: Loose::Parsed(vec!["T1".into(), "T2".into()]),
            attributes: Some(Loose::Parsed(attributes)),
            ..Client::default()
        }
    }

    #[test]
    fn csv_flattens_lists_and_objects() {
        let document =
            export_collection(&[client_with_attributes()], ExportFormat::Csv).expect("export");
        let text = String::from_utf8(document.body).expect("utf8");
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("ClientID,ClientName,PriorityLevel,RequestedTaskIDs,GroupTag,AttributesJSON")
        );
        assert_eq!(
            lines.next(),
            Some(r#"C1,"Acme, Inc",2,"T1, T2",,"{""tier"":""gold""}""#)
        );
        assert_eq!(document.file_name, "clients.csv");
        assert_eq!(document.content_type, "text/csv");
    }

    #[test]
    fn csv_appends_extra_columns_after_canonical_ones() {
        let mut worker = Worker {
            worker_id: "W1".into(),
            worker_name: "Ada".into(),
            skills: Loose::Parsed(vec!["rust".into()]),
            available_slots: Loose::Parsed(vec![Number::from(1), Number::from(3)]),
            max_load_per_phase: Loose::Parsed(Number::from(2)),
            ..Worker::default()
        };
        worker.extra.insert("Shift".into(), json!("night"));

        let document = export_collection(&[worker], ExportFormat::Csv).expect("export");
        let text = String::from_utf8(document.body).expect("utf8");
        let header = text.lines().next().expect("header");
        assert!(header.ends_with("QualificationLevel,Shift"));
        assert!(text.contains("W1,Ada,rust,\"1, 3\",2,,,night"));
    }

    #[test]
    fn json_export_round_trips_through_serde() {
        let document =
            export_collection(&[client_with_attributes()], ExportFormat::Json).expect("export");
        let parsed: Vec<Client> = serde_json::from_slice(&document.body).expect("re-import");
        assert_eq!(parsed, vec![client_with_attributes()]);
        assert_eq!(document.file_name, "clients.json");
    }

    #[test]
    fn empty_collections_are_rejected() {
        let err = export_collection::<Task>(&[], ExportFormat::Json).expect_err("empty");
        assert!(matches!(err, ExportError::EmptyCollection(EntityKind::Tasks)));
        let err = export_dataset(&Dataset::default(), EntityKind::Workers, ExportFormat::Csv)
            .expect_err("empty");
        assert!(matches!(err, ExportError::EmptyCollection(EntityKind::Workers)));
    }

    #[test]
    fn unknown_formats_are_rejected() {
        assert!(matches!(
            "xlsx".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(ref format)) if format == "xlsx"
        ));
    }

    #[test]
    fn rules_document_uses_two_space_indentation() {
        let mut book = RuleBook::new();
        book.add(BusinessRule::co_run(["T1", "T2"]).expect("co-run"))
            .expect("added");
        let text =
            rules_config_json(&RulesConfig::new(&book, PriorityWeights::default())).expect("json");

        assert!(text.starts_with("{\n  \"rules\": [\n    {\n      \"type\": \"coRun\""));
        let parsed: Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(parsed["priorities"]["fairDistribution"], json!(0.5));
    }
}
