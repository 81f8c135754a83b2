//! Business rules and priority weights.
//!
//! Rules are inert data: they are checked structurally when built and carried
//! in insertion order into the rules configuration export. Nothing here decides
//! whether a set of rules is satisfiable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BusinessRule {
    /// The referenced tasks must be scheduled together.
    CoRun { tasks: Vec<String> },
    /// Caps concurrent load for a worker group.
    LoadLimit {
        #[serde(rename = "workerGroup")]
        worker_group: String,
        #[serde(rename = "maxSlotsPerPhase")]
        max_slots_per_phase: i64,
    },
    /// Restricts a task to a subset of phases.
    PhaseWindow {
        #[serde(rename = "taskID")]
        task_id: String,
        #[serde(rename = "allowedPhases")]
        allowed_phases: Vec<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRule {
    #[error("co-run rule requires at least two distinct tasks (found {0})")]
    TooFewCoRunTasks(usize),
    #[error("load limit requires a worker group")]
    MissingWorkerGroup,
    #[error("load limit must allow at least one slot per phase (found {0})")]
    NonPositiveSlotLimit(i64),
    #[error("phase window requires a task ID")]
    MissingTaskId,
    #[error("allowed phases must contain at least one positive phase number")]
    NoValidPhases,
    #[error("allowed phases must all be positive phase numbers")]
    NonPositivePhase,
    #[error("rule object is malformed: {0}")]
    Malformed(String),
}

impl BusinessRule {
    pub const TYPES: [&'static str; 3] = ["coRun", "loadLimit", "phaseWindow"];

    pub fn co_run<I, S>(tasks: I) -> Result<Self, InvalidRule>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule = Self::CoRun {
            tasks: tasks.into_iter().map(Into::into).collect(),
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn load_limit(worker_group: impl Into<String>, max_slots_per_phase: i64) -> Result<Self, InvalidRule> {
        let rule = Self::LoadLimit {
            worker_group: worker_group.into(),
            max_slots_per_phase,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Phase 0 is dropped before the emptiness check.
    pub fn phase_window(task_id: impl Into<String>, allowed_phases: Vec<u32>) -> Result<Self, InvalidRule> {
        let rule = Self::PhaseWindow {
            task_id: task_id.into(),
            allowed_phases: allowed_phases.into_iter().filter(|phase| *phase > 0).collect(),
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Builds a phase window from free-form input such as `"1, 2, x, 0"`.
    /// Entries that are not positive integers are dropped before the emptiness check.
    pub fn phase_window_from_text(task_id: impl Into<String>, phases: &str) -> Result<Self, InvalidRule> {
        let allowed_phases = phases
            .split(',')
            .filter_map(|entry| entry.trim().parse::<u32>().ok())
            .filter(|phase| *phase > 0)
            .collect();
        Self::phase_window(task_id, allowed_phases)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CoRun { .. } => "coRun",
            Self::LoadLimit { .. } => "loadLimit",
            Self::PhaseWindow { .. } => "phaseWindow",
        }
    }

    /// Re-checks construction preconditions, e.g. after deserializing.
    pub fn validate(&self) -> Result<(), InvalidRule> {
        match self {
            Self::CoRun { tasks } => {
                let distinct: HashSet<&str> = tasks
                    .iter()
                    .map(|task| task.trim())
                    .filter(|task| !task.is_empty())
                    .collect();
                if distinct.len() < 2 {
                    return Err(InvalidRule::TooFewCoRunTasks(distinct.len()));
                }
            }
            Self::LoadLimit {
                worker_group,
                max_slots_per_phase,
            } => {
                if worker_group.trim().is_empty() {
                    return Err(InvalidRule::MissingWorkerGroup);
                }
                if *max_slots_per_phase <= 0 {
                    return Err(InvalidRule::NonPositiveSlotLimit(*max_slots_per_phase));
                }
            }
            Self::PhaseWindow {
                task_id,
                allowed_phases,
            } => {
                if task_id.trim().is_empty() {
                    return Err(InvalidRule::MissingTaskId);
                }
                if allowed_phases.is_empty() {
                    return Err(InvalidRule::NoValidPhases);
                }
                if allowed_phases.contains(&0) {
                    return Err(InvalidRule::NonPositivePhase);
                }
            }
        }
        Ok(())
    }

    /// Interprets a rule object returned by the conversion collaborator.
    ///
    /// A missing, empty or unrecognised `type` means no rule was produced and
    /// yields `Ok(None)`. A recognised type with unusable fields is an error.
    pub fn from_collaborator(value: &Value) -> Result<Option<Self>, InvalidRule> {
        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return Ok(None);
        };
        if !Self::TYPES.contains(&kind) {
            return Ok(None);
        }

        let mut value = value.clone();
        if let Some(Value::Array(phases)) = value.get_mut("allowedPhases") {
            phases.retain(|phase| phase.as_u64().is_some_and(|phase| phase > 0));
        }

        let rule: Self = serde_json::from_value(value)
            .map_err(|err| InvalidRule::Malformed(err.to_string()))?;
        rule.validate()?;
        Ok(Some(rule))
    }
}

impl fmt::Display for BusinessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoRun { tasks } => {
                write!(f, "Co-run: Tasks [{}] must run together.", tasks.join(", "))
            }
            Self::LoadLimit {
                worker_group,
                max_slots_per_phase,
            } => write!(
                f,
                "Load Limit: Worker Group \"{worker_group}\" has max {max_slots_per_phase} slots per phase."
            ),
            Self::PhaseWindow {
                task_id,
                allowed_phases,
            } => {
                let phases: Vec<String> = allowed_phases.iter().map(u32::to_string).collect();
                write!(
                    f,
                    "Phase Window: Task \"{task_id}\" allowed in phases [{}].",
                    phases.join(", ")
                )
            }
        }
    }
}

/// Ordered rule list. Insertion order is display and export order; duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleBook {
    rules: Vec<BusinessRule>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: BusinessRule) -> Result<(), InvalidRule> {
        rule.validate()?;
        self.rules.push(rule);
        Ok(())
    }

    /// Removes the rule at `index`; out-of-range positions leave the book unchanged.
    pub fn remove(&mut self, index: usize) -> Option<BusinessRule> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BusinessRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn as_slice(&self) -> &[BusinessRule] {
        &self.rules
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriorityError {
    #[error("unknown priority weight `{0}`")]
    UnknownKey(String),
    #[error("priority weight `{key}` must be a number between 0 and 1 (found {value})")]
    OutOfRange { key: String, value: Value },
}

/// Independent allocation sliders. They are not required to sum to one and
/// nothing in this crate consumes them beyond export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityWeights {
    pub priority_level_fulfillment: f64,
    pub fair_distribution: f64,
    pub minimizing_workload: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            priority_level_fulfillment: 0.5,
            fair_distribution: 0.5,
            minimizing_workload: 0.5,
        }
    }
}

impl PriorityWeights {
    pub const KEYS: [&'static str; 3] = [
        "priorityLevelFulfillment",
        "fairDistribution",
        "minimizingWorkload",
    ];

    /// Applies a partial update. Any rejected entry leaves every weight untouched.
    pub fn merge(&mut self, updates: &Map<String, Value>) -> Result<(), PriorityError> {
        let mut next = *self;
        for (key, value) in updates {
            let weight = value
                .as_f64()
                .filter(|weight| (0.0..=1.0).contains(weight))
                .ok_or_else(|| PriorityError::OutOfRange {
                    key: key.clone(),
                    value: value.clone(),
                });
            let slot = match key.as_str() {
                "priorityLevelFulfillment" => &mut next.priority_level_fulfillment,
                "fairDistribution" => &mut next.fair_distribution,
                "minimizingWorkload" => &mut next.minimizing_workload,
                other => return Err(PriorityError::UnknownKey(other.to_string())),
            };
            *slot = weight?;
        }
        *self = next;
        Ok(())
    }

    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("priorityLevelFulfillment", self.priority_level_fulfillment),
            ("fairDistribution", self.fair_distribution),
            ("minimizingWorkload", self.minimizing_workload),
        ])
    }
}

/// The rules configuration document: `{ rules, priorities }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    pub rules: Vec<BusinessRule>,
    pub priorities: PriorityWeights,
}

impl RulesConfig {
    pub fn new(book: &RuleBook, priorities: PriorityWeights) -> Self {
        Self {
            rules: book.as_slice().to_vec(),
            priorities,
        }
    }
}
