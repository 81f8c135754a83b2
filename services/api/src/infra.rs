use allocation_curator::curation::{Client, Dataset, Entity, EntityKind, Task, Worker};
use allocation_curator::error::AppError;
use allocation_curator::ingest::EntityImporter;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) max_import_rows: usize,
}

/// Optional source files for each collection. A missing path means an empty collection.
#[derive(Debug, Default, Clone)]
pub(crate) struct DatasetPaths {
    pub(crate) clients: Option<PathBuf>,
    pub(crate) workers: Option<PathBuf>,
    pub(crate) tasks: Option<PathBuf>,
}

fn load_collection<E: Entity>(
    importer: &EntityImporter,
    path: Option<&Path>,
) -> Result<Vec<E>, AppError> {
    match path {
        Some(path) => Ok(importer.import_path(path)?),
        None => Ok(Vec::new()),
    }
}

pub(crate) fn load_dataset(
    paths: &DatasetPaths,
    importer: &EntityImporter,
) -> Result<Dataset, AppError> {
    Ok(Dataset {
        clients: load_collection::<Client>(importer, paths.clients.as_deref())?,
        workers: load_collection::<Worker>(importer, paths.workers.as_deref())?,
        tasks: load_collection::<Task>(importer, paths.tasks.as_deref())?,
    })
}

pub(crate) fn parse_entity(value: &str) -> Result<EntityKind, String> {
    EntityKind::from_name(value)
        .ok_or_else(|| format!("unknown entity `{value}` (expected clients, workers or tasks)"))
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    AppState {
        readiness: Arc::new(AtomicBool::new(true)),
        metrics: Arc::new(recorder.handle()),
        max_import_rows: 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn entity_names_parse_for_the_command_line() {
        assert_eq!(parse_entity("workers"), Ok(EntityKind::Workers));
        assert!(parse_entity("projects").is_err());
    }

    #[test]
    fn missing_paths_load_as_empty_collections() {
        let dir = std::env::temp_dir().join(format!("curator-infra-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let tasks = dir.join("tasks.csv");
        let mut file = std::fs::File::create(&tasks).expect("tasks file");
        writeln!(file, "TaskID,TaskName,Duration,RequiredSkills,PreferredPhases,MaxConcurrent")
            .expect("header");
        writeln!(file, "T1,Setup,1,rust,1,1").expect("row");

        let paths = DatasetPaths {
            tasks: Some(tasks),
            ..DatasetPaths::default()
        };
        let dataset = load_dataset(&paths, &EntityImporter::new(10)).expect("dataset loads");
        assert!(dataset.clients.is_empty());
        assert_eq!(dataset.tasks.len(), 1);
        assert_eq!(dataset.tasks[0].task_id, "T1");

        std::fs::remove_dir_all(&dir).ok();
    }
}
