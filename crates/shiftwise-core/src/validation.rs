//! Domain-level solution validation.
//!
//! Converts a continuous candidate into its discrete schedule, re-runs the
//! constraint checker, and reports pass/fail with recommendations derived
//! from violation severity. An invalid solution is a normal outcome here,
//! not an error.

use serde::{Deserialize, Serialize};

use crate::constraints::{IntegrationLayer, ProcessedConstraints, RawConstraints, Severity, Violation};
use crate::model::{Schedule, Solution};
use crate::types::ProblemContext;

/// Result of validating one candidate solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the candidate satisfies every hard constraint.
    pub valid: bool,

    /// The discretized schedule.
    pub schedule: Schedule,

    /// Quick confidence estimate in `[0, 1]` based on the hard and soft
    /// component scores (the full scorer also weighs solver agreement and
    /// history).
    pub confidence: f64,

    /// All violations, hard and soft.
    pub violations: Vec<Violation>,

    /// Severity-derived guidance for fixing the schedule.
    pub recommendations: Vec<String>,
}

impl ValidationReport {
    /// Violations of the given severity.
    pub fn violations_of(&self, severity: Severity) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.severity == severity)
    }
}

/// Validates a solution against already-processed constraints.
pub fn validate_solution(
    solution: &Solution,
    processed: &ProcessedConstraints,
    ctx: &ProblemContext,
) -> ValidationReport {
    let breakdown = processed.breakdown(solution, ctx);
    let valid = breakdown
        .violations
        .iter()
        .all(|v| v.severity != Severity::Critical);

    let confidence = (0.7 * breakdown.hard_score / 100.0 + 0.3 * breakdown.soft_score / 100.0)
        .clamp(0.0, 1.0);

    let recommendations = build_recommendations(&breakdown.violations);

    ValidationReport {
        valid,
        schedule: solution.to_schedule(ctx),
        confidence,
        violations: breakdown.violations,
        recommendations,
    }
}

/// Processes the raw constraints first, then validates.
pub fn validate_raw(
    solution: &Solution,
    raw: &RawConstraints,
    ctx: &ProblemContext,
) -> ValidationReport {
    let processed = IntegrationLayer::new().process(raw, ctx);
    validate_solution(solution, &processed, ctx)
}

fn build_recommendations(violations: &[Violation]) -> Vec<String> {
    let mut recommendations = Vec::new();

    let count_of = |name: &str| violations.iter().filter(|v| v.constraint == name).count();

    if count_of("group_conflict") > 0 {
        recommendations.push(
            "Stagger days off and early shifts within affected staff groups".to_string(),
        );
    }
    if count_of("group_coverage") > 0 || count_of("backup_assignment") > 0 {
        recommendations
            .push("Convert off days to working shifts to restore coverage".to_string());
    }
    if count_of("early_shift_permission") > 0 {
        recommendations.push(
            "Reassign unpermitted early shifts or record the missing permissions".to_string(),
        );
    }
    if count_of("calendar_rule") > 0 {
        recommendations.push("Align the affected dates with their calendar overrides".to_string());
    }
    if count_of("daily_limit") > 0 || count_of("monthly_max") > 0 {
        recommendations.push("Reduce over-limit shift counts on the flagged days".to_string());
    }

    let critical = violations
        .iter()
        .filter(|v| v.severity == Severity::Critical)
        .count();
    if critical > 5 {
        recommendations.push(format!(
            "{} critical violations: consider regenerating rather than repairing",
            critical
        ));
    }

    recommendations
}
