//! Staff priority rules: preferred or required shift kinds per condition.

use std::sync::Arc;

use crate::constraints::processor::{
    ConstraintEval, ConstraintProcessor, PenaltyFn, ProcessError, ProcessorOutput, SoftConstraint,
};
use crate::constraints::{PriorityRule, RawConstraints, Severity, Violation};
use crate::model::Solution;
use crate::types::ProblemContext;

/// Processor for the priority-rule family.
///
/// Required rules become hard constraints; preferred rules become soft
/// constraints weighted by their priority level. The family overrides the
/// default penalty so higher-priority misses cost more.
pub struct PriorityRuleProcessor;

impl ConstraintProcessor for PriorityRuleProcessor {
    fn name(&self) -> &str {
        "priority_rule"
    }

    fn process(
        &self,
        raw: &RawConstraints,
        _ctx: &ProblemContext,
    ) -> Result<ProcessorOutput, ProcessError> {
        let mut output = ProcessorOutput::default();

        for rule in &raw.priority_rules {
            if rule.priority == 0 {
                return Err(ProcessError::MalformedRecord {
                    family: self.name().to_string(),
                    reason: format!("priority 0 on rule for '{}'", rule.staff_id),
                });
            }
            let eval = Arc::new(PriorityConstraint { rule: rule.clone() });
            if rule.hard {
                output.hard.push(eval);
            } else {
                output.soft.push(SoftConstraint {
                    eval,
                    weight: rule.priority as f64,
                });
            }
        }

        output.weight = 1.5;
        let penalty: PenaltyFn = Arc::new(|v: &Violation| match v.severity {
            Severity::Critical => v.magnitude * 50.0,
            _ => v.magnitude * 15.0,
        });
        output.penalty = Some(("priority_rule".to_string(), penalty));
        Ok(output)
    }
}

/// A slot under an applicable rule must carry the rule's shift kind.
pub struct PriorityConstraint {
    rule: PriorityRule,
}

impl ConstraintEval for PriorityConstraint {
    fn name(&self) -> &str {
        "priority_rule"
    }

    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation> {
        let Some(staff_idx) = ctx.staff_index(&self.rule.staff_id) else {
            return Vec::new();
        };

        let mut violations = Vec::new();
        for (d, date) in ctx.dates.iter().enumerate() {
            if !self.rule.applies_on(*date) {
                continue;
            }
            let actual = solution.kind_at(staff_idx, d);
            if actual != self.rule.shift_kind {
                violations.push(Violation {
                    constraint: self.name().to_string(),
                    severity: if self.rule.hard {
                        Severity::Critical
                    } else if self.rule.priority >= 3 {
                        Severity::High
                    } else {
                        Severity::Medium
                    },
                    date: Some(*date),
                    staff_id: Some(self.rule.staff_id.clone()),
                    magnitude: 1.0,
                    conflict_count: None,
                    detail: format!(
                        "'{}' is {} on {} but the rule {} {}",
                        self.rule.staff_id,
                        actual,
                        date,
                        if self.rule.hard { "requires" } else { "prefers" },
                        self.rule.shift_kind
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
    use chrono::NaiveDate;

    fn ctx() -> ProblemContext {
        ProblemContext::new(
            vec!["a".into(), "b".into()],
            (0..5)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + chrono::Days::new(i))
                .collect(),
        )
    }

    fn rule(hard: bool, priority: u8) -> PriorityRule {
        PriorityRule {
            staff_id: "a".into(),
            weekdays: vec![],
            from: None,
            to: None,
            shift_kind: ShiftKind::Normal,
            priority,
            hard,
        }
    }

    #[test]
    fn test_required_rule_violations_are_critical() {
        let ctx = ctx();
        let eval = PriorityConstraint { rule: rule(true, 1) };
        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        solution.set(0, 2, ShiftKind::Off.to_value());
        let violations = eval.evaluate(&solution, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Critical);
    }

    #[test]
    fn test_high_priority_preference_is_high_severity() {
        let ctx = ctx();
        let eval = PriorityConstraint { rule: rule(false, 3) };
        let mut solution = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        solution.set(0, 0, ShiftKind::Late.to_value());
        assert_eq!(eval.evaluate(&solution, &ctx)[0].severity, Severity::High);
    }

    #[test]
    fn test_soft_rules_weighted_by_priority() {
        let ctx = ctx();
        let mut raw = RawConstraints::default();
        raw.priority_rules.push(rule(false, 4));
        let output = PriorityRuleProcessor.process(&raw, &ctx).unwrap();
        assert_eq!(output.soft.len(), 1);
        assert_eq!(output.soft[0].weight, 4.0);
        assert!(output.penalty.is_some());
    }

    #[test]
    fn test_zero_priority_is_malformed() {
        let ctx = ctx();
        let mut raw = RawConstraints::default();
        raw.priority_rules.push(rule(false, 0));
        assert!(PriorityRuleProcessor.process(&raw, &ctx).is_err());
    }
}
