//! Integrity checks over the client/worker/task collections.
//!
//! [`run_validations`] is pure and total: every check group runs on every
//! pass, in a fixed order, and malformed input becomes a finding rather than a
//! failure. Findings are produced fresh each pass and never merged.

mod checks;

use super::domain::Dataset;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// ID reported when the owning entity has no usable ID.
pub const UNKNOWN_ID: &str = "unknown";

/// `Error` blocks export; `Warning` is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
        }
    }
}

/// One reported validation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub severity: Severity,
}

impl ValidationFinding {
    pub(crate) fn error(id: &str, field: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(id, field, message, Severity::Error)
    }

    pub(crate) fn warning(id: &str, field: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(id, field, message, Severity::Warning)
    }

    fn new(id: &str, field: Option<&str>, message: impl Into<String>, severity: Severity) -> Self {
        let id = if id.is_empty() { UNKNOWN_ID } else { id };
        Self {
            id: id.to_string(),
            field: field.map(str::to_string),
            message: message.into(),
            severity,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ID: {} | ", self.severity.label(), self.id)?;
        if let Some(field) = &self.field {
            write!(f, "Field: {field} | ")?;
        }
        f.write_str(&self.message)
    }
}

/// Run every check group over the dataset, in order.
pub fn run_validations(dataset: &Dataset) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    checks::required_fields(dataset, &mut findings);
    checks::duplicate_ids(dataset, &mut findings);
    checks::shapes_and_ranges(dataset, &mut findings);
    checks::requested_task_references(dataset, &mut findings);
    checks::skill_coverage(dataset, &mut findings);
    checks::worker_capacity(dataset, &mut findings);
    checks::preferred_phase_numbers(dataset, &mut findings);
    checks::worker_skill_strings(dataset, &mut findings);

    let report = ValidationReport::from_findings(&findings);
    debug!(
        clients = dataset.clients.len(),
        workers = dataset.workers.len(),
        tasks = dataset.tasks.len(),
        errors = report.errors,
        warnings = report.warnings,
        "validation pass complete"
    );

    findings
}

/// Severity tally for a set of findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: usize,
    pub warnings: usize,
}

impl ValidationReport {
    pub fn from_findings(findings: &[ValidationFinding]) -> Self {
        findings
            .iter()
            .fold(Self::default(), |mut report, finding| {
                match finding.severity {
                    Severity::Error => report.errors += 1,
                    Severity::Warning => report.warnings += 1,
                }
                report
            })
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }

    pub fn export_ready(&self) -> bool {
        self.errors == 0
    }
}
