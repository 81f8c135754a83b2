use allocation_curator::curation::{
    skill_risks, BusinessRule, Client, CurationState, Dataset, EntityKind, Task, Worker,
};
use allocation_curator::export::{export_dataset, rules_config_json, ExportFormat};
use allocation_curator::ingest::{EntityImporter, ImportFormat};
use serde_json::{json, Value};
use std::io::Cursor;

const CLIENTS_CSV: &str = "ClientID,ClientName,PriorityLevel,RequestedTaskIDs,GroupTag,AttributesJSON\n\
C1,Acme,6,\"T1,T2\",Enterprise,\"{\"\"tier\"\":\"\"gold\"\"}\"\n\
C2,Globex,2,T2,,\n";

const WORKERS_CSV: &str = "WorkerID,WorkerName,Skills,AvailableSlots,MaxLoadPerPhase,WorkerGroup,QualificationLevel\n\
W1,Ada,\"rust, sql\",\"[1,2,3]\",2,GroupA,senior\n\
W2,Grace,design,\"2,4\",1,GroupB,\n";

const TASKS_CSV: &str = "TaskID,TaskName,Category,Duration,RequiredSkills,PreferredPhases,MaxConcurrent\n\
T1,Build,Engineering,2,rust,1-3,1\n\
T2,Review,,1,\"design, welding\",2,1\n";

fn import_csv_dataset() -> Dataset {
    let importer = EntityImporter::new(100);
    Dataset {
        clients: importer
            .import(Cursor::new(CLIENTS_CSV), ImportFormat::Csv)
            .expect("clients import"),
        workers: importer
            .import(Cursor::new(WORKERS_CSV), ImportFormat::Csv)
            .expect("workers import"),
        tasks: importer
            .import(Cursor::new(TASKS_CSV), ImportFormat::Csv)
            .expect("tasks import"),
    }
}

#[test]
fn imported_csv_is_validated_fixed_and_exported() {
    let mut state = CurationState::with_dataset(import_csv_dataset());

    let messages: Vec<_> = state
        .findings()
        .iter()
        .map(|finding| finding.to_string())
        .collect();
    assert_eq!(
        messages,
        vec![
            "[ERROR] ID: C1 | Field: PriorityLevel | PriorityLevel must be between 1 and 5",
            "[WARNING] ID: T2 | Field: RequiredSkills | No worker found with skill \"welding\"",
        ]
    );
    assert_eq!(state.readiness().score, 90);
    assert!(!state.readiness().export_ready);

    let matched = state
        .apply_action(&json!({
            "action": "update_many",
            "entity": "clients",
            "filter": { "ClientID": "C1" },
            "changes": { "PriorityLevel": 5 }
        }))
        .expect("fix applies");
    assert_eq!(matched, 1);

    let readiness = state.readiness();
    assert_eq!(readiness.errors, 0);
    assert_eq!(readiness.warnings, 1);
    assert!(readiness.export_ready);

    let document =
        export_dataset(state.dataset(), EntityKind::Clients, ExportFormat::Csv).expect("export");
    assert_eq!(document.file_name, "clients.csv");
    let reimported: Vec<Client> = EntityImporter::new(100)
        .import(Cursor::new(document.body), ImportFormat::Csv)
        .expect("re-import");
    assert_eq!(reimported, state.dataset().clients);
}

#[test]
fn exported_workers_and_tasks_import_unchanged() {
    let dataset = import_csv_dataset();
    let importer = EntityImporter::new(100);

    let workers = export_dataset(&dataset, EntityKind::Workers, ExportFormat::Csv).expect("export");
    let text = String::from_utf8(workers.body.clone()).expect("utf8");
    assert!(text.contains("W1,Ada,\"rust, sql\",\"1, 2, 3\",2,GroupA,senior"));
    let reimported: Vec<Worker> = importer
        .import(Cursor::new(workers.body), ImportFormat::Csv)
        .expect("workers re-import");
    assert_eq!(reimported, dataset.workers);

    let tasks = export_dataset(&dataset, EntityKind::Tasks, ExportFormat::Json).expect("export");
    let reimported: Vec<Task> = importer
        .import(Cursor::new(tasks.body), ImportFormat::Json)
        .expect("tasks re-import");
    assert_eq!(reimported, dataset.tasks);
}

#[test]
fn missing_skills_surface_as_recommendations() {
    assert_eq!(
        skill_risks(&import_csv_dataset()),
        vec![
            "Risk Identified: Task 'T2 (Review)' requires the skill \"welding\", which no worker has."
        ]
    );
}

#[test]
fn rules_and_priorities_export_as_one_document() {
    let mut state = CurationState::with_dataset(import_csv_dataset());
    state
        .add_rule(BusinessRule::co_run(["T1", "T2"]).expect("co-run"))
        .expect("rule added");
    state
        .add_rule(BusinessRule::phase_window_from_text("T1", "1, 2, x").expect("window"))
        .expect("rule added");
    state
        .update_priorities(
            json!({ "priorityLevelFulfillment": 0.8 })
                .as_object()
                .expect("object"),
        )
        .expect("weights merge");

    let text = rules_config_json(&state.rules_config()).expect("rules json");
    let document: Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(
        document["rules"],
        json!([
            { "type": "coRun", "tasks": ["T1", "T2"] },
            { "type": "phaseWindow", "taskID": "T1", "allowedPhases": [1, 2] }
        ])
    );
    assert_eq!(document["priorities"]["priorityLevelFulfillment"], json!(0.8));
    assert_eq!(document["priorities"]["fairDistribution"], json!(0.5));

    assert_eq!(
        state.remove_rule(0),
        Some(BusinessRule::co_run(["T1", "T2"]).expect("co-run"))
    );
    assert_eq!(state.rules().len(), 1);
}
