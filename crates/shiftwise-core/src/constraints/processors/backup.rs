//! Backup assignments: ordered stand-ins for depleted staff groups.

use std::sync::Arc;

use crate::constraints::processor::{
    ConstraintEval, ConstraintProcessor, ProcessError, ProcessorOutput, SoftConstraint,
};
use crate::constraints::{BackupAssignment, RawConstraints, Severity, StaffGroup, Violation};
use crate::model::{ShiftKind, Solution};
use crate::types::ProblemContext;

/// Processor for the backup-assignment family.
///
/// When every primary member of a group is off on a date, the first listed
/// backup should be working. A depleted group with no working backup is a
/// high-severity soft violation.
pub struct BackupProcessor;

impl ConstraintProcessor for BackupProcessor {
    fn name(&self) -> &str {
        "backup_assignment"
    }

    fn process(
        &self,
        raw: &RawConstraints,
        _ctx: &ProblemContext,
    ) -> Result<ProcessorOutput, ProcessError> {
        let mut output = ProcessorOutput::default();

        for assignment in &raw.backup_assignments {
            if assignment.backups.is_empty() {
                return Err(ProcessError::MalformedRecord {
                    family: self.name().to_string(),
                    reason: format!("no backups listed for group '{}'", assignment.group_id),
                });
            }
            let Some(group) = raw
                .staff_groups
                .iter()
                .find(|g| g.id == assignment.group_id)
            else {
                return Err(ProcessError::MalformedRecord {
                    family: self.name().to_string(),
                    reason: format!("unknown group '{}'", assignment.group_id),
                });
            };

            output.soft.push(SoftConstraint {
                eval: Arc::new(BackupConstraint {
                    group: group.clone(),
                    assignment: assignment.clone(),
                }),
                weight: 2.0,
            });
        }

        output.weight = 1.5;
        Ok(output)
    }
}

/// First listed backup should be working whenever the whole group is off.
pub struct BackupConstraint {
    group: StaffGroup,
    assignment: BackupAssignment,
}

impl ConstraintEval for BackupConstraint {
    fn name(&self) -> &str {
        "backup_assignment"
    }

    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation> {
        let member_indices: Vec<usize> = self
            .group
            .members
            .iter()
            .filter_map(|id| ctx.staff_index(id))
            .collect();
        if member_indices.is_empty() {
            return Vec::new();
        }

        let mut violations = Vec::new();
        for (d, date) in ctx.dates.iter().enumerate() {
            let all_off = member_indices
                .iter()
                .all(|s| solution.kind_at(*s, d) == ShiftKind::Off);
            if !all_off {
                continue;
            }

            let covering = self
                .assignment
                .backups
                .iter()
                .filter_map(|id| ctx.staff_index(id))
                .any(|idx| solution.kind_at(idx, d).is_working());

            if !covering {
                violations.push(Violation {
                    constraint: self.name().to_string(),
                    severity: Severity::High,
                    date: Some(*date),
                    staff_id: Some(self.assignment.backups[0].clone()),
                    magnitude: 1.0,
                    conflict_count: None,
                    detail: format!(
                        "group '{}' is fully off on {} and no listed backup is working",
                        self.group.id, date
                    ),
                });
            }
        }
        violations
    }
}
