//! Constraint processor and evaluator contracts.
//!
//! Each rule family implements [`ConstraintProcessor`] and is dispatched
//! dynamically by the integration layer; adding a family never touches the
//! aggregator.
//!
//! # Isolation Contract
//! Processors operate in isolation:
//! - No shared mutable state between processors
//! - Same input always produces same output
//! - A processor failure is absorbed by the integration layer, never
//!   propagated to the caller

use std::sync::Arc;

use thiserror::Error;

use super::{RawConstraints, Violation};
use crate::model::Solution;
use crate::types::ProblemContext;

/// Errors from processing one rule family.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Malformed {family} record: {reason}")]
    MalformedRecord { family: String, reason: String },

    #[error("Unknown staff reference '{0}'")]
    UnknownStaff(String),
}

/// An evaluable constraint: inspects a candidate solution and reports
/// violations.
pub trait ConstraintEval: Send + Sync {
    /// Constraint-type name (e.g. `"group_conflict"`).
    fn name(&self) -> &str;

    /// Evaluates the solution, returning zero or more violations.
    fn evaluate(&self, solution: &Solution, ctx: &ProblemContext) -> Vec<Violation>;
}

/// A soft constraint: an evaluator plus its preference weight.
#[derive(Clone)]
pub struct SoftConstraint {
    /// The evaluator.
    pub eval: Arc<dyn ConstraintEval>,

    /// Preference weight, scaled later by the weight-adjustment policy.
    pub weight: f64,
}

/// Penalty function applied per violation when computing the penalty
/// component of the objective.
pub type PenaltyFn = Arc<dyn Fn(&Violation) -> f64 + Send + Sync>;

/// A non-constraint scoring target (balance, fairness) returning `[0, 100]`.
#[derive(Clone)]
pub struct OptimizationTarget {
    /// Target name.
    pub name: String,

    /// Weight in the objective-score weighted mean.
    pub weight: f64,

    /// Scoring function.
    pub score: Arc<dyn Fn(&Solution, &ProblemContext) -> f64 + Send + Sync>,
}

/// Everything a processor contributes for its rule family.
#[derive(Default)]
pub struct ProcessorOutput {
    /// Hard constraints: violations invalidate the solution.
    pub hard: Vec<Arc<dyn ConstraintEval>>,

    /// Weighted soft constraints.
    pub soft: Vec<SoftConstraint>,

    /// Base weight contribution of this family.
    pub weight: f64,

    /// Penalty function for this family's constraint-type name, if it
    /// overrides the default.
    pub penalty: Option<(String, PenaltyFn)>,

    /// Optimization targets contributed by this family.
    pub targets: Vec<OptimizationTarget>,
}

/// A processor for one rule family.
pub trait ConstraintProcessor: Send + Sync {
    /// Rule-family name, used as the dispatch key and in skip warnings.
    fn name(&self) -> &str;

    /// Turns the family's raw records into typed constraint objects.
    fn process(
        &self,
        raw: &RawConstraints,
        ctx: &ProblemContext,
    ) -> Result<ProcessorOutput, ProcessError>;
}

impl std::fmt::Debug for SoftConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftConstraint")
            .field("name", &self.eval.name())
            .field("weight", &self.weight)
            .finish()
    }
}

impl std::fmt::Debug for OptimizationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizationTarget")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}
