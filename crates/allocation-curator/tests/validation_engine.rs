use allocation_curator::curation::{
    readiness_score, run_validations, Dataset, ReadinessSummary, Severity,
};
use serde_json::{json, Value};

fn dataset(value: Value) -> Dataset {
    serde_json::from_value(value).expect("dataset deserializes")
}

fn summary(findings: &[allocation_curator::curation::ValidationFinding]) -> Vec<(String, String)> {
    findings
        .iter()
        .map(|finding| (finding.id.clone(), finding.message.clone()))
        .collect()
}

#[test]
fn out_of_range_priority_blocks_export() {
    let dataset = dataset(json!({
        "clients": [
            { "ClientID": "C1", "ClientName": "Acme", "PriorityLevel": 6, "RequestedTaskIDs": ["T1"] }
        ],
        "workers": [
            { "WorkerID": "W1", "WorkerName": "Ada", "Skills": ["rust"], "AvailableSlots": [1, 2],
              "MaxLoadPerPhase": 1 }
        ],
        "tasks": [
            { "TaskID": "T1", "TaskName": "Setup", "Duration": 1, "RequiredSkills": ["rust"],
              "PreferredPhases": [1], "MaxConcurrent": 1 }
        ]
    }));

    let findings = run_validations(&dataset);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Error);
    assert_eq!(findings[0].field.as_deref(), Some("PriorityLevel"));
    assert_eq!(findings[0].message, "PriorityLevel must be between 1 and 5");

    assert_eq!(readiness_score(&findings), 95);
    assert!(!ReadinessSummary::from_findings(&findings).export_ready);
}

#[test]
fn wrongly_shaped_wire_values_become_findings() {
    let dataset = dataset(json!({
        "workers": [
            { "WorkerID": "W1", "WorkerName": "Ada", "Skills": "rust", "AvailableSlots": [1],
              "MaxLoadPerPhase": 1 }
        ]
    }));

    let findings = run_validations(&dataset);
    assert_eq!(
        summary(&findings),
        vec![(
            "W1".to_string(),
            "Skills must be an array of strings".to_string()
        )]
    );
}

#[test]
fn duplicates_are_reported_before_dangling_references() {
    let dataset = dataset(json!({
        "clients": [
            { "ClientID": "C1", "ClientName": "Acme", "PriorityLevel": 1, "RequestedTaskIDs": ["T9"] }
        ],
        "tasks": [
            { "TaskID": "T1", "TaskName": "Setup", "Duration": 1, "RequiredSkills": [],
              "PreferredPhases": [1], "MaxConcurrent": 1 },
            { "TaskID": "T1", "TaskName": "Setup again", "Duration": 1, "RequiredSkills": [],
              "PreferredPhases": [1], "MaxConcurrent": 1 }
        ]
    }));

    let findings = run_validations(&dataset);
    assert_eq!(
        summary(&findings),
        vec![
            ("T1".to_string(), "Duplicate Task ID found: T1".to_string()),
            (
                "C1".to_string(),
                "Requested Task ID \"T9\" does not exist".to_string()
            ),
        ]
    );
}

#[test]
fn findings_serialize_with_lowercase_severity() {
    let dataset = dataset(json!({
        "clients": [ { "ClientID": "C1", "PriorityLevel": 2, "RequestedTaskIDs": [] } ]
    }));

    let findings = run_validations(&dataset);
    let value = serde_json::to_value(&findings).expect("findings serialize");
    assert_eq!(
        value,
        json!([
            { "id": "C1", "field": "ClientName", "message": "Missing ClientName", "severity": "error" }
        ])
    );
}

#[test]
fn an_empty_dataset_is_ready() {
    let findings = run_validations(&Dataset::default());
    assert!(findings.is_empty());
    let summary = ReadinessSummary::from_findings(&findings);
    assert_eq!(summary.score, 100);
    assert!(summary.export_ready);
}

#[test]
fn null_names_and_ids_are_reported_not_rejected() {
    let dataset = dataset(json!({
        "clients": [
            { "ClientID": "C1", "ClientName": null, "PriorityLevel": 2, "RequestedTaskIDs": [] }
        ],
        "workers": [
            { "WorkerID": null, "WorkerName": "Ada", "Skills": ["rust"], "AvailableSlots": [1],
              "MaxLoadPerPhase": 1 }
        ],
        "tasks": []
    }));

    let findings = run_validations(&dataset);
    let fields: Vec<_> = findings
        .iter()
        .map(|finding| (finding.id.as_str(), finding.field.as_deref()))
        .collect();
    assert_eq!(
        fields,
        vec![("C1", Some("ClientName")), ("unknown", Some("WorkerID"))]
    );
    assert_eq!(findings[0].message, "Missing ClientName");
}
