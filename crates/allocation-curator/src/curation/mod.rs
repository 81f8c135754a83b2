pub mod domain;
pub mod modification;
pub mod readiness;
pub mod recommendations;
pub mod rules;
pub mod search;
pub mod state;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

pub use domain::{Client, Dataset, Entity, EntityKind, Loose, Task, Worker};
pub use modification::{
    apply_modification, ActionKind, ModificationCommand, ModificationError, ModificationOutcome,
};
pub use readiness::{readiness_score, ReadinessLevel, ReadinessSummary};
pub use recommendations::{skill_risks, DatasetSnapshot};
pub use rules::{BusinessRule, InvalidRule, PriorityError, PriorityWeights, RuleBook, RulesConfig};
pub use search::{filter_records, FilterOperator, SearchError, SearchFilter};
pub use state::CurationState;
pub use validation::{run_validations, Severity, ValidationFinding, ValidationReport};
