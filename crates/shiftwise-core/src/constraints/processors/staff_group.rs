//! Staff-group conflicts, coverage rules, and proximity rules.
//!
//! The group-conflict evaluation is the representative hard constraint of
//! the system: for each date, members of a group whose slot discretizes to
//! Off or Early are counted; more than one such member on the same date is
//! a critical violation for that date.

use std::sync::Arc;

use crate::constraints::processor::{
    ConstraintEval, ConstraintProcessor, ProcessError, ProcessorOutput, SoftConstraint,
};
use crate::constraints::{RawConstraints, Severity, StaffGroup, Violation};
use crate::model::{ShiftKind, Solution};
use crate::types::ProblemContext;

/// Processor for the staff-group rule family.
pub struct StaffGroupProcessor;

impl ConstraintProcessor for StaffGroupProcessor {
    fn name(&self) -> &str {
        "staff_group"
    }

    fn process(
        &self,
        raw: &RawConstraints,
        _ctx: &ProblemContext,
    ) -> Result<ProcessorOutput, ProcessError> {
        let mut output = ProcessorOutput::default();

        for group in &raw.staff_groups {
            if group.members.is_empty() {
                return Err(ProcessError::MalformedRecord {
                    family: self.name().to_string(),
                    reason: format!("group '{}' has no members", group.id),
                });
            }

            output.hard.push(Arc::new(GroupConflictConstraint {
                group: group.clone(),
            }));

            if group.coverage.is_some() {
                output.hard.push(Arc::new(CoverageConstraint {
                    group: group.clone(),
                }));
            }

            if group.proximity.is_some() {
                output.soft.push(SoftConstraint {
                    eval: Arc::new(ProximityConstraint {
                        group: group.clone(),
                    }),
                    weight: 2.0,
                });
            }
        }

        output.weight = 3.0;
        Ok(output)
    }
}

/// No two members of a group may be off or on early shift on the same date.
pub struct GroupConflictConstraint {
    group: StaffGroup,
}

impl ConstraintEval for GroupConflictConstraint {
    fn name(&self) -> &str {
        "group_conflict"
    }

    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation> {
        let member_indices: Vec<usize> = self
            .group
            .members
            .iter()
            .filter_map(|id| ctx.staff_index(id))
            .collect();

        let mut violations = Vec::new();
        for (d, date) in ctx.dates.iter().enumerate() {
            let conflicting = member_indices
                .iter()
                .filter(|s| solution.kind_at(**s, d).is_off_or_early())
                .count();

            if conflicting > 1 {
                violations.push(Violation {
                    constraint: self.name().to_string(),
                    severity: Severity::Critical,
                    date: Some(*date),
                    staff_id: None,
                    magnitude: 1.0,
                    conflict_count: Some(conflicting),
                    detail: format!(
                        "{} members of group '{}' are off or on early shift on {}",
                        conflicting, self.group.id, date
                    ),
                });
            }
        }
        violations
    }
}

/// When any member of a group is off, the designated backup must be working
/// the configured shift kind.
pub struct CoverageConstraint {
    group: StaffGroup,
}

impl ConstraintEval for CoverageConstraint {
    fn name(&self) -> &str {
        "group_coverage"
    }

    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation> {
        let Some(coverage) = &self.group.coverage else {
            return Vec::new();
        };
        let Some(backup_idx) = ctx.staff_index(&coverage.backup_staff) else {
            return Vec::new();
        };
        let member_indices: Vec<usize> = self
            .group
            .members
            .iter()
            .filter_map(|id| ctx.staff_index(id))
            .collect();

        let mut violations = Vec::new();
        for (d, date) in ctx.dates.iter().enumerate() {
            let any_off = member_indices
                .iter()
                .any(|s| solution.kind_at(*s, d) == ShiftKind::Off);

            if any_off && solution.kind_at(backup_idx, d) != coverage.shift_kind {
                violations.push(Violation {
                    constraint: self.name().to_string(),
                    severity: Severity::Critical,
                    date: Some(*date),
                    staff_id: Some(coverage.backup_staff.clone()),
                    magnitude: 1.0,
                    conflict_count: None,
                    detail: format!(
                        "backup '{}' must work {} on {} while group '{}' members are off",
                        coverage.backup_staff, coverage.shift_kind, date, self.group.id
                    ),
                });
            }
        }
        violations
    }
}

/// Two staff members' days off should fall within N days of each other.
pub struct ProximityConstraint {
    group: StaffGroup,
}

impl ConstraintEval for ProximityConstraint {
    fn name(&self) -> &str {
        "group_proximity"
    }

    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation> {
        let Some(rule) = &self.group.proximity else {
            return Vec::new();
        };
        let (Some(a_idx), Some(b_idx)) =
            (ctx.staff_index(&rule.staff_a), ctx.staff_index(&rule.staff_b))
        else {
            return Vec::new();
        };

        let off_dates = |idx: usize| -> Vec<usize> {
            (0..ctx.dates.len())
                .filter(|d| solution.kind_at(idx, *d) == ShiftKind::Off)
                .collect()
        };
        let a_off = off_dates(a_idx);
        let b_off = off_dates(b_idx);
        if a_off.is_empty() || b_off.is_empty() {
            return Vec::new();
        }

        let mut violations = Vec::new();
        for d in &a_off {
            let nearest = b_off
                .iter()
                .map(|b| b.abs_diff(*d))
                .min()
                .unwrap_or(usize::MAX);
            if nearest > rule.max_distance_days as usize {
                violations.push(Violation {
                    constraint: self.name().to_string(),
                    severity: Severity::Medium,
                    date: Some(ctx.dates[*d]),
                    staff_id: Some(rule.staff_a.clone()),
                    magnitude: 1.0,
                    conflict_count: None,
                    detail: format!(
                        "day off of '{}' on {} is {} days from the nearest day off of '{}' (max {})",
                        rule.staff_a, ctx.dates[*d], nearest, rule.staff_b, rule.max_distance_days
                    ),
                });
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{CoverageRule, ProximityRule};
    use chrono::NaiveDate;

    fn ctx() -> ProblemContext {
        ProblemContext::new(
            vec!["a".into(), "b".into(), "c".into()],
            (0..5)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + chrono::Days::new(i))
                .collect(),
        )
    }

    fn group(members: &[&str]) -> StaffGroup {
        StaffGroup {
            id: "g1".into(),
            members: members.iter().map(|s| s.to_string()).collect(),
            coverage: None,
            proximity: None,
        }
    }

    #[test]
    fn test_one_member_off_is_no_conflict() {
        let ctx = ctx();
        let eval = GroupConflictConstraint {
            group: group(&["a", "b"]),
        };
        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        solution.set(0, 2, ShiftKind::Off.to_value());
        assert!(eval.evaluate(&solution, &ctx).is_empty());
    }

    #[test]
    fn test_off_plus_early_same_date_is_one_critical_violation() {
        let ctx = ctx();
        let eval = GroupConflictConstraint {
            group: group(&["a", "b"]),
        };
        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        solution.set(0, 2, ShiftKind::Off.to_value());
        solution.set(1, 2, ShiftKind::Early.to_value());

        let violations = eval.evaluate(&solution, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Critical);
        assert_eq!(violations[0].conflict_count, Some(2));
        assert_eq!(violations[0].magnitude, 1.0);
        assert_eq!(violations[0].date, Some(ctx.dates[2]));
    }

    #[test]
    fn test_late_and_normal_never_conflict() {
        let ctx = ctx();
        let eval = GroupConflictConstraint {
            group: group(&["a", "b", "c"]),
        };
        let mut solution = Solution::filled(&ctx, ShiftKind::Late.to_value());
        solution.set(2, 0, ShiftKind::Off.to_value());
        assert!(eval.evaluate(&solution, &ctx).is_empty());
    }

    #[test]
    fn test_magnitude_counts_critical_dates() {
        let ctx = ctx();
        let eval = GroupConflictConstraint {
            group: group(&["a", "b"]),
        };
        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        // Conflicts on two separate dates.
        for d in [1, 3] {
            solution.set(0, d, ShiftKind::Off.to_value());
            solution.set(1, d, ShiftKind::Off.to_value());
        }
        let violations = eval.evaluate(&solution, &ctx);
        assert_eq!(violations.len(), 2);
        let total: f64 = violations.iter().map(|v| v.magnitude).sum();
        assert_eq!(total, 2.0);
    }

    #[test]
    fn test_coverage_requires_backup_shift() {
        let ctx = ctx();
        let mut g = group(&["a", "b"]);
        g.coverage = Some(CoverageRule {
            backup_staff: "c".into(),
            shift_kind: ShiftKind::Normal,
        });
        let eval = CoverageConstraint { group: g };

        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        solution.set(0, 1, ShiftKind::Off.to_value());
        // Backup is working Normal: no violation.
        assert!(eval.evaluate(&solution, &ctx).is_empty());

        // Backup off the same day: violation.
        solution.set(2, 1, ShiftKind::Off.to_value());
        let violations = eval.evaluate(&solution, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Critical);
    }

    #[test]
    fn test_proximity_flags_distant_days_off() {
        let ctx = ctx();
        let mut g = group(&["a", "b"]);
        g.proximity = Some(ProximityRule {
            staff_a: "a".into(),
            staff_b: "b".into(),
            max_distance_days: 1,
        });
        let eval = ProximityConstraint { group: g };

        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        solution.set(0, 0, ShiftKind::Off.to_value());
        solution.set(1, 4, ShiftKind::Off.to_value());
        let violations = eval.evaluate(&solution, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Medium);

        // Move b's day off adjacent: within distance.
        solution.set(1, 4, ShiftKind::Normal.to_value());
        solution.set(1, 1, ShiftKind::Off.to_value());
        assert!(eval.evaluate(&solution, &ctx).is_empty());
    }

    #[test]
    fn test_empty_group_is_malformed() {
        let ctx = ctx();
        let mut raw = RawConstraints::default();
        raw.staff_groups.push(group(&[]));
        let result = StaffGroupProcessor.process(&raw, &ctx);
        assert!(matches!(
            result,
            Err(ProcessError::MalformedRecord { .. })
        ));
    }
}
