//! Early-shift permissions.
//!
//! Permission is resolved per slot: an exact-date entry wins, then the
//! per-staff default entry, then "not permitted". Any Early slot without
//! permission is a critical violation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::constraints::processor::{
    ConstraintEval, ConstraintProcessor, ProcessError, ProcessorOutput,
};
use crate::constraints::{EarlyShiftPermission, RawConstraints, Severity, Violation};
use crate::model::{ShiftKind, Solution};
use crate::types::ProblemContext;

/// Processor for the early-shift-permission family.
pub struct EarlyShiftProcessor;

impl ConstraintProcessor for EarlyShiftProcessor {
    fn name(&self) -> &str {
        "early_shift_permission"
    }

    fn process(
        &self,
        raw: &RawConstraints,
        _ctx: &ProblemContext,
    ) -> Result<ProcessorOutput, ProcessError> {
        let mut output = ProcessorOutput::default();
        output.hard.push(Arc::new(EarlyShiftConstraint::new(
            &raw.early_shift_permissions,
        )));
        output.weight = 2.5;
        Ok(output)
    }
}

/// Every Early slot must be permitted for its staff member and date.
pub struct EarlyShiftConstraint {
    exact: HashMap<(String, NaiveDate), bool>,
    defaults: HashMap<String, bool>,
}

impl EarlyShiftConstraint {
    /// Indexes permission entries for per-slot lookup.
    pub fn new(permissions: &[EarlyShiftPermission]) -> Self {
        let mut exact = HashMap::new();
        let mut defaults = HashMap::new();
        for p in permissions {
            match p.date {
                Some(date) => {
                    exact.insert((p.staff_id.clone(), date), p.permitted);
                }
                None => {
                    defaults.insert(p.staff_id.clone(), p.permitted);
                }
            }
        }
        Self { exact, defaults }
    }

    /// Exact-date entry, then per-staff default, then not permitted.
    fn is_permitted(&self, staff_id: &str, date: NaiveDate) -> bool {
        if let Some(p) = self.exact.get(&(staff_id.to_string(), date)) {
            return *p;
        }
        self.defaults.get(staff_id).copied().unwrap_or(false)
    }
}

impl ConstraintEval for EarlyShiftConstraint {
    fn name(&self) -> &str {
        "early_shift_permission"
    }

    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (s, staff_id) in ctx.staff_ids.iter().enumerate() {
            for (d, date) in ctx.dates.iter().enumerate() {
                if solution.kind_at(s, d) == ShiftKind::Early && !self.is_permitted(staff_id, *date)
                {
                    violations.push(Violation {
                        constraint: self.name().to_string(),
                        severity: Severity::Critical,
                        date: Some(*date),
                        staff_id: Some(staff_id.clone()),
                        magnitude: 1.0,
                        conflict_count: None,
                        detail: format!(
                            "'{}' is assigned an early shift on {} without permission",
                            staff_id, date
                        ),
                    });
                }
            }
        }
        violations
    }
}
