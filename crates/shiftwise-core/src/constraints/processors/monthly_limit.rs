//! Per-staff monthly shift-count bounds and the workload-balance target.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Datelike;

use crate::constraints::processor::{
    ConstraintEval, ConstraintProcessor, OptimizationTarget, ProcessError, ProcessorOutput,
    SoftConstraint,
};
use crate::constraints::{MonthlyLimit, RawConstraints, Severity, Violation};
use crate::model::Solution;
use crate::types::ProblemContext;

/// Processor for the monthly-limit rule family.
///
/// Maximums are hard (overworking a person past the cap invalidates the
/// schedule); minimums are soft preferences. The family also contributes a
/// workload-balance optimization target.
pub struct MonthlyLimitProcessor;

impl ConstraintProcessor for MonthlyLimitProcessor {
    fn name(&self) -> &str {
        "monthly_limit"
    }

    fn process(
        &self,
        raw: &RawConstraints,
        _ctx: &ProblemContext,
    ) -> Result<ProcessorOutput, ProcessError> {
        let mut output = ProcessorOutput::default();

        for limit in &raw.monthly_limits {
            if limit.max_count.is_none() && limit.min_count.is_none() {
                return Err(ProcessError::MalformedRecord {
                    family: self.name().to_string(),
                    reason: "monthly limit with neither max nor min".to_string(),
                });
            }
            if limit.max_count.is_some() {
                output.hard.push(Arc::new(MonthlyMaxConstraint {
                    limit: limit.clone(),
                }));
            }
            if limit.min_count.is_some() {
                output.soft.push(SoftConstraint {
                    eval: Arc::new(MonthlyMinConstraint {
                        limit: limit.clone(),
                    }),
                    weight: 1.0,
                });
            }
        }

        output.weight = 2.0;
        output.targets.push(OptimizationTarget {
            name: "workload_balance".to_string(),
            weight: 1.0,
            score: Arc::new(workload_balance_score),
        });
        Ok(output)
    }
}

/// Per-staff counts of a kind grouped by (year, month).
fn monthly_counts(
    solution: &Solution,
    ctx: &ProblemContext,
    staff_idx: usize,
    kind: crate::model::ShiftKind,
) -> BTreeMap<(i32, u32), usize> {
    let mut counts = BTreeMap::new();
    for (d, date) in ctx.dates.iter().enumerate() {
        if solution.kind_at(staff_idx, d) == kind {
            *counts.entry((date.year(), date.month())).or_insert(0) += 1;
        }
    }
    counts
}

fn affected_staff<'a>(limit: &'a MonthlyLimit, ctx: &'a ProblemContext) -> Vec<(usize, &'a str)> {
    match &limit.staff_id {
        Some(id) => ctx
            .staff_index(id)
            .map(|idx| vec![(idx, id.as_str())])
            .unwrap_or_default(),
        None => ctx
            .staff_ids
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.as_str()))
            .collect(),
    }
}

/// Hard cap on a shift kind per staff member per calendar month.
pub struct MonthlyMaxConstraint {
    limit: MonthlyLimit,
}

impl ConstraintEval for MonthlyMaxConstraint {
    fn name(&self) -> &str {
        "monthly_max"
    }

    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation> {
        let max = match self.limit.max_count {
            Some(m) => m as usize,
            None => return Vec::new(),
        };
        let mut violations = Vec::new();
        for (idx, staff_id) in affected_staff(&self.limit, ctx) {
            for ((year, month), count) in monthly_counts(solution, ctx, idx, self.limit.shift_kind)
            {
                if count > max {
                    violations.push(Violation {
                        constraint: self.name().to_string(),
                        severity: Severity::Critical,
                        date: None,
                        staff_id: Some(staff_id.to_string()),
                        magnitude: (count - max) as f64,
                        conflict_count: None,
                        detail: format!(
                            "'{}' has {} {} shifts in {}-{:02} (max {})",
                            staff_id, count, self.limit.shift_kind, year, month, max
                        ),
                    });
                }
            }
        }
        violations
    }
}

/// Soft floor on a shift kind per staff member per calendar month.
pub struct MonthlyMinConstraint {
    limit: MonthlyLimit,
}

impl ConstraintEval for MonthlyMinConstraint {
    fn name(&self) -> &str {
        "monthly_min"
    }

    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation> {
        let min = match self.limit.min_count {
            Some(m) => m as usize,
            None => return Vec::new(),
        };

        // Every month present in the date range counts, including months
        // where the staff member has zero of the kind.
        let mut months: Vec<(i32, u32)> = ctx.dates.iter().map(|d| (d.year(), d.month())).collect();
        months.dedup();

        let mut violations = Vec::new();
        for (idx, staff_id) in affected_staff(&self.limit, ctx) {
            let counts = monthly_counts(solution, ctx, idx, self.limit.shift_kind);
            for (year, month) in &months {
                let count = counts.get(&(*year, *month)).copied().unwrap_or(0);
                if count < min {
                    violations.push(Violation {
                        constraint: self.name().to_string(),
                        severity: Severity::Medium,
                        date: None,
                        staff_id: Some(staff_id.to_string()),
                        magnitude: (min - count) as f64,
                        conflict_count: None,
                        detail: format!(
                            "'{}' has {} {} shifts in {}-{:02} (min {})",
                            staff_id, count, self.limit.shift_kind, year, month, min
                        ),
                    });
                }
            }
        }
        violations
    }
}

/// Workload balance in `[0, 100]`: 100 when every staff member works the
/// same number of days, decreasing with the spread.
fn workload_balance_score(solution: &Solution, ctx: &ProblemContext) -> f64 {
    if ctx.staff_ids.is_empty() || ctx.dates.is_empty() {
        return 100.0;
    }
    let counts: Vec<f64> = (0..ctx.staff_ids.len())
        .map(|s| {
            (0..ctx.dates.len())
                .filter(|d| solution.kind_at(s, *d).is_working())
                .count() as f64
        })
        .collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    let spread = variance.sqrt() / ctx.dates.len() as f64;
    (100.0 * (1.0 - spread)).clamp(0.0, 100.0)
}
