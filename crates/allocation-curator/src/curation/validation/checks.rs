use super::ValidationFinding;
use crate::curation::domain::{is_integral, number_value, Dataset, Entity, Loose};
use serde_json::{Number, Value};
use std::collections::HashSet;

type Findings = Vec<ValidationFinding>;

fn numeric(value: &Loose<Number>) -> Option<f64> {
    value.parsed().and_then(number_value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number_value(number).is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_phase_number(number: &Number) -> bool {
    is_integral(number) && number_value(number).is_some_and(|n| n >= 1.0)
}

fn is_positive_integer(value: &Value) -> bool {
    match value {
        Value::Number(number) => is_phase_number(number),
        _ => false,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub(super) fn required_fields(dataset: &Dataset, findings: &mut Findings) {
    for client in &dataset.clients {
        let id = client.id();
        if id.is_empty() {
            findings.push(ValidationFinding::error(id, Some("ClientID"), "Missing ClientID"));
        }
        if client.client_name.is_empty() {
            findings.push(ValidationFinding::error(
                id,
                Some("ClientName"),
                "Missing ClientName",
            ));
        }
        if numeric(&client.priority_level).is_none() {
            findings.push(ValidationFinding::error(
                id,
                Some("PriorityLevel"),
                "Missing or invalid PriorityLevel",
            ));
        }
    }

    for worker in &dataset.workers {
        let id = worker.id();
        if id.is_empty() {
            findings.push(ValidationFinding::error(id, Some("WorkerID"), "Missing WorkerID"));
        }
        if worker.worker_name.is_empty() {
            findings.push(ValidationFinding::error(
                id,
                Some("WorkerName"),
                "Missing WorkerName",
            ));
        }
        if numeric(&worker.max_load_per_phase).is_none() {
            findings.push(ValidationFinding::error(
                id,
                Some("MaxLoadPerPhase"),
                "Missing or invalid MaxLoadPerPhase",
            ));
        }
    }

    for task in &dataset.tasks {
        let id = task.id();
        if id.is_empty() {
            findings.push(ValidationFinding::error(id, Some("TaskID"), "Missing TaskID"));
        }
        if task.task_name.is_empty() {
            findings.push(ValidationFinding::error(id, Some("TaskName"), "Missing TaskName"));
        }
        if numeric(&task.duration).is_none() {
            findings.push(ValidationFinding::error(
                id,
                Some("Duration"),
                "Missing or invalid Duration",
            ));
        }
        if numeric(&task.max_concurrent).is_none() {
            findings.push(ValidationFinding::error(
                id,
                Some("MaxConcurrent"),
                "Missing or invalid MaxConcurrent",
            ));
        }
    }
}

fn duplicates_in<E: Entity>(records: &[E], findings: &mut Findings) {
    let kind = E::KIND;
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    for record in records {
        let id = record.id();
        if !seen.insert(id) {
            findings.push(ValidationFinding::error(
                id,
                Some(kind.id_column()),
                format!("Duplicate {} ID found: {}", kind.singular(), id),
            ));
        }
    }
}

pub(super) fn duplicate_ids(dataset: &Dataset, findings: &mut Findings) {
    duplicates_in(&dataset.clients, findings);
    duplicates_in(&dataset.workers, findings);
    duplicates_in(&dataset.tasks, findings);
}

pub(super) fn shapes_and_ranges(dataset: &Dataset, findings: &mut Findings) {
    for client in &dataset.clients {
        let id = client.id();
        if !client.requested_task_ids.is_parsed() {
            findings.push(ValidationFinding::error(
                id,
                Some("RequestedTaskIDs"),
                "RequestedTaskIDs is not an array",
            ));
        }
        if let Some(level) = numeric(&client.priority_level) {
            if !(1.0..=5.0).contains(&level) {
                findings.push(ValidationFinding::error(
                    id,
                    Some("PriorityLevel"),
                    "PriorityLevel must be between 1 and 5",
                ));
            }
        }
        if let Some(Loose::Raw(raw)) = &client.attributes {
            if is_truthy(raw) {
                findings.push(ValidationFinding::error(
                    id,
                    Some("AttributesJSON"),
                    "AttributesJSON is malformed",
                ));
            }
        }
    }

    for worker in &dataset.workers {
        let id = worker.id();
        if !worker.skills.is_parsed() {
            findings.push(ValidationFinding::error(
                id,
                Some("Skills"),
                "Skills must be an array of strings",
            ));
        }
        if !worker.available_slots.is_parsed() {
            findings.push(ValidationFinding::error(
                id,
                Some("AvailableSlots"),
                "AvailableSlots must be an array of numbers",
            ));
        }
        if numeric(&worker.max_load_per_phase).is_some_and(|load| load < 0.0) {
            findings.push(ValidationFinding::error(
                id,
                Some("MaxLoadPerPhase"),
                "MaxLoadPerPhase cannot be negative",
            ));
        }
    }

    for task in &dataset.tasks {
        let id = task.id();
        if numeric(&task.duration).is_some_and(|duration| duration < 1.0) {
            findings.push(ValidationFinding::error(
                id,
                Some("Duration"),
                "Duration must be at least 1",
            ));
        }
        if !task.required_skills.is_parsed() {
            findings.push(ValidationFinding::error(
                id,
                Some("RequiredSkills"),
                "RequiredSkills must be an array of strings",
            ));
        }
        let phases_ok = task.preferred_phases.parsed().is_some_and(|phases| {
            phases
                .iter()
                .all(|phase| number_value(phase).is_some_and(|n| n >= 1.0))
        });
        if !phases_ok {
            findings.push(ValidationFinding::error(
                id,
                Some("PreferredPhases"),
                "PreferredPhases must be an array of positive numbers",
            ));
        }
        if numeric(&task.max_concurrent).is_some_and(|limit| limit < 1.0) {
            findings.push(ValidationFinding::error(
                id,
                Some("MaxConcurrent"),
                "MaxConcurrent must be at least 1",
            ));
        }
    }
}

pub(super) fn requested_task_references(dataset: &Dataset, findings: &mut Findings) {
    let task_ids: HashSet<&str> = dataset.tasks.iter().map(|task| task.id()).collect();

    for client in &dataset.clients {
        let Some(requested) = client.requested_task_ids.parsed() else {
            continue;
        };
        for task_id in requested {
            if !task_ids.contains(task_id.as_str()) {
                findings.push(ValidationFinding::error(
                    client.id(),
                    Some("RequestedTaskIDs"),
                    format!("Requested Task ID \"{task_id}\" does not exist"),
                ));
            }
        }
    }
}

pub(super) fn skill_coverage(dataset: &Dataset, findings: &mut Findings) {
    let worker_skills: HashSet<&str> = dataset
        .workers
        .iter()
        .filter_map(|worker| worker.skills.parsed())
        .flatten()
        .map(String::as_str)
        .collect();

    for task in &dataset.tasks {
        let Some(required) = task.required_skills.parsed() else {
            continue;
        };
        for skill in required {
            if !worker_skills.contains(skill.as_str()) {
                findings.push(ValidationFinding::warning(
                    task.id(),
                    Some("RequiredSkills"),
                    format!("No worker found with skill \"{skill}\""),
                ));
            }
        }
    }
}

pub(super) fn worker_capacity(dataset: &Dataset, findings: &mut Findings) {
    for worker in &dataset.workers {
        let (Some(slots), Some(max_load)) = (
            worker.available_slots.list_len(),
            numeric(&worker.max_load_per_phase),
        ) else {
            continue;
        };

        if (slots as f64) < max_load {
            findings.push(ValidationFinding::warning(
                worker.id(),
                Some("MaxLoadPerPhase"),
                format!(
                    "Worker has fewer available slots ({slots}) than MaxLoadPerPhase ({max_load})"
                ),
            ));
        }
    }
}

pub(super) fn preferred_phase_numbers(dataset: &Dataset, findings: &mut Findings) {
    for task in &dataset.tasks {
        let invalid: Vec<String> = match &task.preferred_phases {
            Loose::Parsed(phases) => phases
                .iter()
                .filter(|phase| !is_phase_number(phase))
                .map(Number::to_string)
                .collect(),
            Loose::Raw(Value::Array(entries)) => entries
                .iter()
                .filter(|entry| !is_positive_integer(entry))
                .map(render)
                .collect(),
            Loose::Raw(_) => Vec::new(),
        };

        for phase in invalid {
            findings.push(ValidationFinding::error(
                task.id(),
                Some("PreferredPhases"),
                format!("Invalid phase number in PreferredPhases: {phase}"),
            ));
        }
    }
}

pub(super) fn worker_skill_strings(dataset: &Dataset, findings: &mut Findings) {
    for worker in &dataset.workers {
        let malformed = match &worker.skills {
            Loose::Parsed(skills) => skills.iter().any(|skill| skill.trim().is_empty()),
            Loose::Raw(Value::Array(entries)) => entries.iter().any(|entry| match entry {
                Value::String(skill) => skill.trim().is_empty(),
                _ => true,
            }),
            Loose::Raw(_) => false,
        };

        if malformed {
            findings.push(ValidationFinding::error(
                worker.id(),
                Some("Skills"),
                "Skills array contains empty or non-string values",
            ));
        }
    }
}
