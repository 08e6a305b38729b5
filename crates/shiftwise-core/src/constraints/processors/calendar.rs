//! Calendar overrides: must-work and must-day-off dates.

use std::sync::Arc;

use crate::constraints::processor::{
    ConstraintEval, ConstraintProcessor, ProcessError, ProcessorOutput,
};
use crate::constraints::{CalendarDemand, CalendarRule, RawConstraints, Severity, Violation};
use crate::model::{ShiftKind, Solution};
use crate::types::ProblemContext;

/// Processor for the calendar-rule family.
pub struct CalendarProcessor;

impl ConstraintProcessor for CalendarProcessor {
    fn name(&self) -> &str {
        "calendar_rule"
    }

    fn process(
        &self,
        raw: &RawConstraints,
        _ctx: &ProblemContext,
    ) -> Result<ProcessorOutput, ProcessError> {
        let mut output = ProcessorOutput::default();
        if !raw.calendar_rules.is_empty() {
            output.hard.push(Arc::new(CalendarConstraint {
                rules: raw.calendar_rules.clone(),
            }));
        }
        output.weight = 2.5;
        Ok(output)
    }
}

/// A `must_work` date requires a non-Off kind; a `must_day_off` date
/// requires Off. Any mismatch is a critical violation.
pub struct CalendarConstraint {
    rules: Vec<CalendarRule>,
}

impl ConstraintEval for CalendarConstraint {
    fn name(&self) -> &str {
        "calendar_rule"
    }

    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        for rule in &self.rules {
            let Some(d) = ctx.date_index(rule.date) else {
                continue;
            };
            let affected: Vec<(usize, &String)> = if rule.staff_ids.is_empty() {
                ctx.staff_ids.iter().enumerate().collect()
            } else {
                rule.staff_ids
                    .iter()
                    .filter_map(|id| ctx.staff_index(id).map(|idx| (idx, id)))
                    .collect()
            };

            for (s, staff_id) in affected {
                let kind = solution.kind_at(s, d);
                let satisfied = match rule.demand {
                    CalendarDemand::MustWork => kind.is_working(),
                    CalendarDemand::MustDayOff => kind == ShiftKind::Off,
                };
                if !satisfied {
                    violations.push(Violation {
                        constraint: self.name().to_string(),
                        severity: Severity::Critical,
                        date: Some(rule.date),
                        staff_id: Some(staff_id.clone()),
                        magnitude: 1.0,
                        conflict_count: None,
                        detail: format!(
                            "'{}' is {} on {} but the calendar demands {}",
                            staff_id,
                            kind,
                            rule.date,
                            match rule.demand {
                                CalendarDemand::MustWork => "a working shift",
                                CalendarDemand::MustDayOff => "a day off",
                            }
                        ),
                    });
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> ProblemContext {
        ProblemContext::new(
            vec!["a".into(), "b".into()],
            (0..3)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + chrono::Days::new(i))
                .collect(),
        )
    }

    #[test]
    fn test_must_work_rejects_off() {
        let ctx = ctx();
        let eval = CalendarConstraint {
            rules: vec![CalendarRule {
                date: ctx.dates[0],
                staff_ids: vec![],
                demand: CalendarDemand::MustWork,
            }],
        };
        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        solution.set(1, 0, ShiftKind::Off.to_value());
        let violations = eval.evaluate(&solution, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].staff_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_must_day_off_requires_off() {
        let ctx = ctx();
        let eval = CalendarConstraint {
            rules: vec![CalendarRule {
                date: ctx.dates[2],
                staff_ids: vec!["a".into()],
                demand: CalendarDemand::MustDayOff,
            }],
        };
        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        let violations = eval.evaluate(&solution, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Critical);

        solution.set(0, 2, ShiftKind::Off.to_value());
        assert!(eval.evaluate(&solution, &ctx).is_empty());
    }

    #[test]
    fn test_dates_outside_range_ignored() {
        let ctx = ctx();
        let eval = CalendarConstraint {
            rules: vec![CalendarRule {
                date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                staff_ids: vec![],
                demand: CalendarDemand::MustWork,
            }],
        };
        let solution = Solution::filled(&ctx, ShiftKind::Off.to_value());
        assert!(eval.evaluate(&solution, &ctx).is_empty());
    }
}
