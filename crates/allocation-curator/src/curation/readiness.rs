use super::validation::{ValidationFinding, ValidationReport};
use serde::Serialize;

const PENALTY_PER_FINDING: usize = 5;
const HIGHLIGHT_LIMIT: usize = 5;

/// `100 - 5 * findings`, clamped to `0..=100`. Warnings cost as much as errors.
pub fn readiness_score(findings: &[ValidationFinding]) -> u8 {
    let penalty = findings.len().saturating_mul(PENALTY_PER_FINDING);
    100usize.saturating_sub(penalty) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessLevel {
    Ready,
    Advisory,
    Blocked,
}

impl ReadinessLevel {
    fn from_report(report: &ValidationReport) -> Self {
        if report.errors > 0 {
            Self::Blocked
        } else if report.warnings > 0 {
            Self::Advisory
        } else {
            Self::Ready
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessSummary {
    pub score: u8,
    pub errors: usize,
    pub warnings: usize,
    pub export_ready: bool,
    pub level: ReadinessLevel,
    pub highlights: Vec<String>,
}

impl ReadinessSummary {
    pub fn from_findings(findings: &[ValidationFinding]) -> Self {
        let report = ValidationReport::from_findings(findings);
        Self {
            score: readiness_score(findings),
            errors: report.errors,
            warnings: report.warnings,
            export_ready: report.export_ready(),
            level: ReadinessLevel::from_report(&report),
            highlights: findings
                .iter()
                .take(HIGHLIGHT_LIMIT)
                .map(ToString::to_string)
                .collect(),
        }
    }
}
