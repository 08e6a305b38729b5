//! Objective function mathematics.
//!
//! The composite score is
//! `0.5*hard + 0.3*soft - 0.05*penalty + 0.15*objective`, clipped to
//! `[0, 100]`. Every component is computed from the same violation pass so
//! callers get a consistent breakdown.

use std::collections::HashMap;
use std::sync::Arc;

use super::processor::{ConstraintEval, OptimizationTarget, PenaltyFn, SoftConstraint};
use super::Violation;
use crate::model::Solution;
use crate::types::ProblemContext;

/// Compiled objective function: solution → score in `[0, 100]`.
pub type ObjectiveFn = Arc<dyn Fn(&Solution) -> f64 + Send + Sync>;

/// Per-violation magnitude multiplier in the hard score.
const HARD_MAGNITUDE_COST: f64 = 20.0;

/// Default penalty rates when no family-specific penalty is registered.
const DEFAULT_HARD_PENALTY: f64 = 50.0;
const DEFAULT_SOFT_PENALTY: f64 = 10.0;

/// Component scores of one objective evaluation.
#[derive(Debug, Clone)]
pub struct ObjectiveBreakdown {
    /// `max(0, 100 - Σ magnitude*20)` over hard violations.
    pub hard_score: f64,

    /// 100 minus the weight-weighted average soft penalty.
    pub soft_score: f64,

    /// Sum of per-violation penalty-function outputs.
    pub penalty_score: f64,

    /// Weighted mean of optimization-target scores.
    pub objective_score: f64,

    /// The clipped composite.
    pub total: f64,

    /// All violations observed during the evaluation.
    pub violations: Vec<Violation>,
}

/// Evaluates every constraint against a solution and computes the
/// composite score with its components.
pub fn evaluate_breakdown(
    solution: &Solution,
    ctx: &ProblemContext,
    hard: &[Arc<dyn ConstraintEval>],
    soft: &[SoftConstraint],
    penalties: &HashMap<String, PenaltyFn>,
    targets: &[OptimizationTarget],
) -> ObjectiveBreakdown {
    let mut violations = Vec::new();
    let mut penalty_score = 0.0;

    // Hard component.
    let mut hard_magnitude = 0.0;
    for constraint in hard {
        for v in constraint.evaluate(solution, ctx) {
            hard_magnitude += v.magnitude;
            penalty_score += penalty_for(&v, penalties, None);
            violations.push(v);
        }
    }
    let hard_score = (100.0 - hard_magnitude * HARD_MAGNITUDE_COST).max(0.0);

    // Soft component: magnitude- and weight-weighted average penalty.
    let mut weighted_penalty = 0.0;
    let mut weight_sum = 0.0;
    for constraint in soft {
        weight_sum += constraint.weight;
        for v in constraint.eval.evaluate(solution, ctx) {
            weighted_penalty += v.magnitude * constraint.weight * DEFAULT_SOFT_PENALTY;
            penalty_score += penalty_for(&v, penalties, Some(constraint.weight));
            violations.push(v);
        }
    }
    let soft_score = if weight_sum > 0.0 {
        (100.0 - weighted_penalty / weight_sum).clamp(0.0, 100.0)
    } else {
        100.0
    };

    // Non-constraint optimization targets.
    let target_weight: f64 = targets.iter().map(|t| t.weight).sum();
    let objective_score = if target_weight > 0.0 {
        targets
            .iter()
            .map(|t| t.weight * (t.score)(solution, ctx).clamp(0.0, 100.0))
            .sum::<f64>()
            / target_weight
    } else {
        100.0
    };

    let total = (0.5 * hard_score + 0.3 * soft_score - 0.05 * penalty_score
        + 0.15 * objective_score)
        .clamp(0.0, 100.0);

    ObjectiveBreakdown {
        hard_score,
        soft_score,
        penalty_score,
        objective_score,
        total,
        violations,
    }
}

/// Penalty for one violation: the registered family function if present,
/// otherwise magnitude×50 for hard and magnitude×10×weight for soft.
fn penalty_for(
    violation: &Violation,
    penalties: &HashMap<String, PenaltyFn>,
    soft_weight: Option<f64>,
) -> f64 {
    if let Some(f) = penalties.get(&violation.constraint) {
        return f(violation);
    }
    match soft_weight {
        None => violation.magnitude * DEFAULT_HARD_PENALTY,
        Some(w) => violation.magnitude * DEFAULT_SOFT_PENALTY * w,
    }
}

/// Compiles the constraint sets into a reusable objective closure.
pub fn compile_objective(
    ctx: ProblemContext,
    hard: Vec<Arc<dyn ConstraintEval>>,
    soft: Vec<SoftConstraint>,
    penalties: HashMap<String, PenaltyFn>,
    targets: Vec<OptimizationTarget>,
) -> ObjectiveFn {
    Arc::new(move |solution: &Solution| {
        evaluate_breakdown(solution, &ctx, &hard, &soft, &penalties, &targets).total
    })
}
