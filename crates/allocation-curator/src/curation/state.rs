use super::domain::{Client, Dataset, Task, Worker};
use super::modification::{apply_modification, ModificationCommand, ModificationError, ModificationOutcome};
use super::readiness::ReadinessSummary;
use super::rules::{BusinessRule, InvalidRule, PriorityError, PriorityWeights, RuleBook, RulesConfig};
use super::validation::{run_validations, ValidationFinding};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Caller-owned curation session: the three collections, the findings for the
/// current collections, and the rule bookkeeping.
///
/// Every collection change swaps in a whole new collection and re-runs
/// validation from scratch. Callers that share a session across threads must
/// serialize access themselves.
#[derive(Debug, Clone, Default)]
pub struct CurationState {
    dataset: Dataset,
    findings: Vec<ValidationFinding>,
    rules: RuleBook,
    priorities: PriorityWeights,
}

impl CurationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        let mut state = Self::default();
        state.commit(dataset);
        state
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn priorities(&self) -> &PriorityWeights {
        &self.priorities
    }

    fn commit(&mut self, dataset: Dataset) {
        self.findings = run_validations(&dataset);
        self.dataset = dataset;
    }

    pub fn replace_clients(&mut self, clients: Vec<Client>) {
        let dataset = Dataset {
            clients,
            ..self.dataset.clone()
        };
        self.commit(dataset);
    }

    pub fn replace_workers(&mut self, workers: Vec<Worker>) {
        let dataset = Dataset {
            workers,
            ..self.dataset.clone()
        };
        self.commit(dataset);
    }

    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        let dataset = Dataset {
            tasks,
            ..self.dataset.clone()
        };
        self.commit(dataset);
    }

    /// Validates and applies an action object. On rejection nothing changes.
    pub fn apply_action(&mut self, action: &Value) -> Result<usize, ModificationError> {
        let command = ModificationCommand::from_action(action).map_err(|err| {
            warn!(error = %err, "invalid modification action");
            err
        })?;
        self.apply_command(&command)
    }

    pub fn apply_command(&mut self, command: &ModificationCommand) -> Result<usize, ModificationError> {
        let ModificationOutcome {
            dataset, matched, ..
        } = apply_modification(&self.dataset, command)?;
        self.commit(dataset);
        Ok(matched)
    }

    pub fn add_rule(&mut self, rule: BusinessRule) -> Result<(), InvalidRule> {
        self.rules.add(rule)?;
        info!(rules = self.rules.len(), "business rule added");
        Ok(())
    }

    pub fn remove_rule(&mut self, index: usize) -> Option<BusinessRule> {
        self.rules.remove(index)
    }

    pub fn update_priorities(&mut self, updates: &Map<String, Value>) -> Result<(), PriorityError> {
        self.priorities.merge(updates)
    }

    /// Drops all collections, findings and rules and restores default weights.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn readiness(&self) -> ReadinessSummary {
        ReadinessSummary::from_findings(&self.findings)
    }

    pub fn rules_config(&self) -> RulesConfig {
        RulesConfig::new(&self.rules, self.priorities)
    }
}
