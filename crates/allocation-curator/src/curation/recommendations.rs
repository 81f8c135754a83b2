//! Heuristic recommendations that need no collaborator.

use super::domain::{number_value, Dataset, Entity};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

const SNAPSHOT_SKILL_LIMIT: usize = 10;

fn normalize_skill(skill: &str) -> String {
    skill.trim().to_lowercase()
}

/// Skills required by a task that no worker lists, compared case-insensitively
/// after trimming. Identical messages are reported once.
pub fn skill_risks(dataset: &Dataset) -> Vec<String> {
    let worker_skills: HashSet<String> = dataset
        .workers
        .iter()
        .filter_map(|worker| worker.skills.parsed())
        .flatten()
        .map(|skill| normalize_skill(skill))
        .collect();

    let mut seen = HashSet::new();
    let mut risks = Vec::new();
    for task in &dataset.tasks {
        let Some(required) = task.required_skills.parsed() else {
            continue;
        };
        for skill in required {
            if worker_skills.contains(&normalize_skill(skill)) {
                continue;
            }
            let message = format!(
                "Risk Identified: Task '{} ({})' requires the skill \"{}\", which no worker has.",
                task.id(),
                task.task_name,
                skill
            );
            if seen.insert(message.clone()) {
                risks.push(message);
            }
        }
    }
    risks
}

/// Summary handed to the advisory collaborator as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSnapshot {
    pub clients: usize,
    pub workers: usize,
    pub tasks: usize,
    pub rules: usize,
    pub high_priority_clients: usize,
    pub worker_skills: Vec<String>,
}

impl DatasetSnapshot {
    pub fn capture(dataset: &Dataset, rules: usize) -> Self {
        let high_priority_clients = dataset
            .clients
            .iter()
            .filter(|client| {
                client
                    .priority_level
                    .parsed()
                    .and_then(number_value)
                    .is_some_and(|level| level == 1.0)
            })
            .count();

        let mut seen = BTreeSet::new();
        let worker_skills = dataset
            .workers
            .iter()
            .filter_map(|worker| worker.skills.parsed())
            .flatten()
            .filter(|skill| seen.insert(skill.as_str()))
            .take(SNAPSHOT_SKILL_LIMIT)
            .cloned()
            .collect();

        Self {
            clients: dataset.clients.len(),
            workers: dataset.workers.len(),
            tasks: dataset.tasks.len(),
            rules,
            high_priority_clients,
            worker_skills,
        }
    }
}
