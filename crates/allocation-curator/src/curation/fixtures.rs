use super::domain::{Client, Dataset, Loose, Task, Worker};
use serde_json::Number;

pub(crate) fn client(id: &str, priority: i64, requested: &[&str]) -> Client {
    Client {
        client_id: id.to_string(),
        client_name: format!("Client {id}"),
        priority_level: Loose::Parsed(Number::from(priority)),
        requested_task_ids: Loose::Parsed(requested.iter().map(|id| id.to_string()).collect()),
        ..Client::default()
    }
}

pub(crate) fn worker(id: &str, skills: &[&str], slots: &[i64], max_load: i64) -> Worker {
    Worker {
        worker_id: id.to_string(),
        worker_name: format!("Worker {id}"),
        skills: Loose::Parsed(skills.iter().map(|skill| skill.to_string()).collect()),
        available_slots: Loose::Parsed(slots.iter().copied().map(Number::from).collect()),
        max_load_per_phase: Loose::Parsed(Number::from(max_load)),
        ..Worker::default()
    }
}

pub(crate) fn grouped_worker(id: &str, group: &str, max_load: i64) -> Worker {
    Worker {
        worker_group: Some(group.to_string()),
        ..worker(id, &["general"], &[1, 2, 3], max_load)
    }
}

pub(crate) fn task(id: &str, skills: &[&str], phases: &[i64]) -> Task {
    Task {
        task_id: id.to_string(),
        task_name: format!("Task {id}"),
        duration: Loose::Parsed(Number::from(1)),
        required_skills: Loose::Parsed(skills.iter().map(|skill| skill.to_string()).collect()),
        preferred_phases: Loose::Parsed(phases.iter().copied().map(Number::from).collect()),
        max_concurrent: Loose::Parsed(Number::from(1)),
        ..Task::default()
    }
}

/// A dataset with no findings: every reference resolves and every skill is covered.
pub(crate) fn clean_dataset() -> Dataset {
    Dataset {
        clients: vec![client("C1", 3, &["T1", "T2"]), client("C2", 1, &["T2"])],
        workers: vec![
            worker("W1", &["rust", "sql"], &[1, 2, 3], 2),
            worker("W2", &["design"], &[2, 4], 1),
        ],
        tasks: vec![
            task("T1", &["rust"], &[1, 2]),
            task("T2", &["design", "sql"], &[3]),
        ],
    }
}
