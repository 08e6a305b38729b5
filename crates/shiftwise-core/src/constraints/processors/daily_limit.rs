//! Daily shift-count limits.

use std::sync::Arc;

use chrono::Datelike;

use crate::constraints::processor::{
    ConstraintEval, ConstraintProcessor, ProcessError, ProcessorOutput, SoftConstraint,
};
use crate::constraints::{DailyLimit, RawConstraints, Severity, Violation};
use crate::model::Solution;
use crate::types::ProblemContext;

/// Processor for the daily-limit rule family.
pub struct DailyLimitProcessor;

impl ConstraintProcessor for DailyLimitProcessor {
    fn name(&self) -> &str {
        "daily_limit"
    }

    fn process(
        &self,
        raw: &RawConstraints,
        _ctx: &ProblemContext,
    ) -> Result<ProcessorOutput, ProcessError> {
        let mut output = ProcessorOutput::default();

        for limit in &raw.daily_limits {
            let eval = Arc::new(DailyLimitConstraint {
                limit: limit.clone(),
            });
            if limit.hard {
                output.hard.push(eval);
            } else {
                output.soft.push(SoftConstraint { eval, weight: 1.5 });
            }
        }

        output.weight = 2.0;
        Ok(output)
    }
}

/// At most `max_count` slots of a kind per day, optionally weekday-scoped.
pub struct DailyLimitConstraint {
    limit: DailyLimit,
}

impl ConstraintEval for DailyLimitConstraint {
    fn name(&self) -> &str {
        "daily_limit"
    }

    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (d, date) in ctx.dates.iter().enumerate() {
            if !self.limit.weekdays.is_empty() && !self.limit.weekdays.contains(&date.weekday()) {
                continue;
            }
            let count = (0..ctx.staff_ids.len())
                .filter(|s| solution.kind_at(*s, d) == self.limit.shift_kind)
                .count();

            if count > self.limit.max_count as usize {
                let excess = count - self.limit.max_count as usize;
                violations.push(Violation {
                    constraint: self.name().to_string(),
                    severity: if self.limit.hard {
                        Severity::Critical
                    } else {
                        Severity::Medium
                    },
                    date: Some(*date),
                    staff_id: None,
                    magnitude: excess as f64,
                    conflict_count: None,
                    detail: format!(
                        "{} {} shifts on {} exceed the limit of {}",
                        count, self.limit.shift_kind, date, self.limit.max_count
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
    use crate::model::ShiftKind;
    use chrono::{NaiveDate, Weekday};

    fn ctx() -> ProblemContext {
        ProblemContext::new(
            vec!["a".into(), "b".into(), "c".into()],
            (0..7)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + chrono::Days::new(i))
                .collect(),
        )
    }

    #[test]
    fn test_excess_off_days_flagged_with_magnitude() {
        let ctx = ctx();
        let eval = DailyLimitConstraint {
            limit: DailyLimit {
                shift_kind: ShiftKind::Off,
                max_count: 1,
                weekdays: vec![],
                hard: true,
            },
        };
        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        for s in 0..3 {
            solution.set(s, 0, ShiftKind::Off.to_value());
        }
        let violations = eval.evaluate(&solution, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].magnitude, 2.0);
        assert_eq!(violations[0].severity, Severity::Critical);
    }

    #[test]
    fn test_weekday_scope() {
        let ctx = ctx();
        let eval = DailyLimitConstraint {
            limit: DailyLimit {
                shift_kind: ShiftKind::Off,
                max_count: 0,
                weekdays: vec![Weekday::Sat, Weekday::Sun],
                hard: false,
            },
        };
        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        // 2026-03-02 is a Monday: two off days there are out of scope.
        solution.set(0, 0, ShiftKind::Off.to_value());
        solution.set(1, 0, ShiftKind::Off.to_value());
        assert!(eval.evaluate(&solution, &ctx).is_empty());

        // 2026-03-07 is a Saturday.
        solution.set(0, 5, ShiftKind::Off.to_value());
        let violations = eval.evaluate(&solution, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Medium);
    }

    #[test]
    fn test_hard_flag_routes_to_hard_set() {
        let ctx = ctx();
        let mut raw = RawConstraints::default();
        raw.daily_limits.push(DailyLimit {
            shift_kind: ShiftKind::Off,
            max_count: 1,
            weekdays: vec![],
            hard: true,
        });
        raw.daily_limits.push(DailyLimit {
            shift_kind: ShiftKind::Early,
            max_count: 2,
            weekdays: vec![],
            hard: false,
        });
        let output = DailyLimitProcessor.process(&raw, &ctx).unwrap();
        assert_eq!(output.hard.len(), 1);
        assert_eq!(output.soft.len(), 1);
    }
}
