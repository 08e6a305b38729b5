//! Constraint Integration Layer.
//!
//! Aggregates the per-family processor outputs into a single evaluable
//! [`ProcessedConstraints`] value: hard and soft constraint sets, penalty
//! functions, optimization targets, a coefficient matrix, and one compiled
//! objective closure.
//!
//! A family that fails to process is skipped with a warning and
//! contributes nothing; the layer itself never fails. Processing is pure,
//! so identical inputs may be cached by fingerprint (the engine keeps a
//! TTL cache keyed by [`fingerprint`]).

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::matrix::ConstraintMatrix;
use super::objective::{compile_objective, evaluate_breakdown, ObjectiveBreakdown, ObjectiveFn};
use super::processor::{
    ConstraintEval, ConstraintProcessor, OptimizationTarget, PenaltyFn, SoftConstraint,
};
use super::processors::default_processors;
use super::RawConstraints;
use crate::model::Solution;
use crate::types::ProblemContext;

/// The uniform evaluable representation of one request's constraints.
#[derive(Clone)]
pub struct ProcessedConstraints {
    /// Hard constraints; any violation invalidates a solution.
    pub hard: Vec<Arc<dyn ConstraintEval>>,

    /// Soft constraints with adjusted weights.
    pub soft: Vec<SoftConstraint>,

    /// Penalty functions by constraint-type name.
    pub penalties: HashMap<String, PenaltyFn>,

    /// Non-constraint optimization targets.
    pub targets: Vec<OptimizationTarget>,

    /// Coefficient view for matrix-oriented algorithms.
    pub matrix: ConstraintMatrix,

    /// The compiled objective function.
    pub objective: ObjectiveFn,
}

impl ProcessedConstraints {
    /// Total number of constraint objects, hard and soft.
    pub fn constraint_count(&self) -> usize {
        self.hard.len() + self.soft.len()
    }

    /// Full component breakdown for one solution.
    pub fn breakdown(&self, solution: &Solution, ctx: &ProblemContext) -> ObjectiveBreakdown {
        evaluate_breakdown(
            solution,
            ctx,
            &self.hard,
            &self.soft,
            &self.penalties,
            &self.targets,
        )
    }
}

impl std::fmt::Debug for ProcessedConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessedConstraints")
            .field("hard", &self.hard.len())
            .field("soft", &self.soft.len())
            .field("targets", &self.targets.len())
            .finish()
    }
}

/// Converts raw rule records into [`ProcessedConstraints`].
pub struct IntegrationLayer {
    processors: Vec<Box<dyn ConstraintProcessor>>,
    performance_multiplier: f64,
}

impl IntegrationLayer {
    /// A layer with all seven rule-family processors.
    pub fn new() -> Self {
        Self {
            processors: default_processors(),
            performance_multiplier: 1.0,
        }
    }

    /// A layer with a custom processor set.
    pub fn with_processors(processors: Vec<Box<dyn ConstraintProcessor>>) -> Self {
        Self {
            processors,
            performance_multiplier: 1.0,
        }
    }

    /// Sets the performance-history weight multiplier (default 1.0).
    pub fn with_performance_multiplier(mut self, multiplier: f64) -> Self {
        self.performance_multiplier = multiplier.max(0.0);
        self
    }

    /// Processes every rule family and merges the outputs.
    ///
    /// Unprocessable families are skipped with a warning; the remaining
    /// families still produce a usable result.
    pub fn process(&self, raw: &RawConstraints, ctx: &ProblemContext) -> ProcessedConstraints {
        let mut hard: Vec<Arc<dyn ConstraintEval>> = Vec::new();
        let mut soft: Vec<SoftConstraint> = Vec::new();
        let mut penalties: HashMap<String, PenaltyFn> = HashMap::new();
        let mut targets: Vec<OptimizationTarget> = Vec::new();

        let size_multiplier = size_multiplier(ctx);
        let soft_multiplier = 1.0 + ctx.complexity * 0.3;

        for processor in &self.processors {
            match processor.process(raw, ctx) {
                Ok(output) => {
                    hard.extend(output.hard);

                    for mut constraint in output.soft {
                        constraint.weight *= output.weight
                            * size_multiplier
                            * soft_multiplier
                            * self.performance_multiplier;
                        soft.push(constraint);
                    }

                    if let Some((name, penalty)) = output.penalty {
                        penalties.insert(name, penalty);
                    }

                    for mut target in output.targets {
                        target.weight *=
                            output.weight * size_multiplier * self.performance_multiplier;
                        targets.push(target);
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        family = processor.name(),
                        error = %error,
                        "Skipping unprocessable rule family"
                    );
                }
            }
        }

        let matrix = ConstraintMatrix::build(raw, ctx);
        let objective = compile_objective(
            ctx.clone(),
            hard.clone(),
            soft.clone(),
            penalties.clone(),
            targets.clone(),
        );

        tracing::debug!(
            hard = hard.len(),
            soft = soft.len(),
            targets = targets.len(),
            "Processed constraints"
        );

        ProcessedConstraints {
            hard,
            soft,
            penalties,
            targets,
            matrix,
            objective,
        }
    }
}

impl Default for IntegrationLayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Weight multiplier from problem size: `min(2.0, 1 + staff*dates/1000)`.
pub fn size_multiplier(ctx: &ProblemContext) -> f64 {
    (1.0 + ctx.slot_count() as f64 / 1000.0).min(2.0)
}

/// Stable fingerprint of the raw constraints plus problem-context summary,
/// used as the processed-constraints cache key.
pub fn fingerprint(raw: &RawConstraints, ctx: &ProblemContext) -> u64 {
    use std::collections::hash_map::DefaultHasher;

    let mut hasher = DefaultHasher::new();
    // Serialized form is stable: every raw type keeps field order.
    if let Ok(serialized) = serde_json::to_string(raw) {
        serialized.hash(&mut hasher);
    }
    ctx.staff_ids.hash(&mut hasher);
    for date in &ctx.dates {
        date.hash(&mut hasher);
    }
    ctx.complexity.to_bits().hash(&mut hasher);
    hasher.finish()
}
