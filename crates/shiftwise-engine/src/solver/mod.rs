//! Solver abstraction and the built-in reference solvers.
//!
//! A solver takes a seed solution and a compiled objective and returns an
//! improved candidate. Solvers never mutate shared state; each one works on
//! its own deep copy of the seed.

mod greedy;
mod local_search;

pub use greedy::GreedySolver;
pub use local_search::LocalSearchSolver;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use shiftwise_core::{ConvergenceReason, ObjectiveFn, ProblemContext, Solution};

/// Errors a solver can report.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("solver produced no candidate: {0}")]
    NoCandidate(String),

    #[error("solver timed out after {0:?}")]
    Timeout(Duration),

    #[error("internal solver failure: {0}")]
    Internal(String),
}

/// Iteration and runtime caps for one solver invocation.
#[derive(Debug, Clone)]
pub struct SolverParams {
    /// Iteration cap.
    pub max_iterations: u64,

    /// Wall-clock cap.
    pub max_runtime: Duration,

    /// Iterations without improvement before stopping.
    pub stagnation_limit: u64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_iterations: 2_000,
            max_runtime: Duration::from_secs(30),
            stagnation_limit: 200,
        }
    }
}

/// Everything one solver invocation needs.
#[derive(Clone)]
pub struct SolveRequest {
    /// Problem characteristics.
    pub ctx: ProblemContext,

    /// Starting point; each solver deep-copies it before mutating.
    pub seed: Solution,

    /// Compiled objective, higher is better.
    pub objective: ObjectiveFn,

    /// Iteration and runtime caps.
    pub params: SolverParams,
}

/// One solver's candidate.
#[derive(Debug, Clone)]
pub struct SolverSolution {
    pub solution: Solution,

    /// Objective value of `solution` in `[0, 100]`.
    pub fitness: f64,

    /// Solver self-assessment in `[0, 1]`.
    pub confidence: f64,

    pub convergence: ConvergenceReason,

    pub iterations: u64,
}

/// A schedule optimization algorithm.
#[async_trait]
pub trait Solver: Send + Sync {
    /// Registered name, unique within a registry.
    fn name(&self) -> &str;

    /// Produces a candidate from the seed. Must respect every cap in
    /// `req.params`.
    async fn solve(&self, req: &SolveRequest) -> Result<SolverSolution, SolverError>;
}

/// Confidence a solver reports for its own candidate, from fitness and how
/// it terminated.
pub(crate) fn self_confidence(fitness: f64, convergence: ConvergenceReason) -> f64 {
    let base = (fitness / 100.0).clamp(0.0, 1.0);
    let factor = match convergence {
        ConvergenceReason::Converged => 1.0,
        ConvergenceReason::Stagnation => 0.9,
        ConvergenceReason::MaxIterations => 0.85,
        ConvergenceReason::TimeLimit => 0.75,
        ConvergenceReason::Failed => 0.0,
    };
    base * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_confidence_orders_by_convergence() {
        let converged = self_confidence(90.0, ConvergenceReason::Converged);
        let stagnated = self_confidence(90.0, ConvergenceReason::Stagnation);
        let timed_out = self_confidence(90.0, ConvergenceReason::TimeLimit);
        assert!(converged > stagnated);
        assert!(stagnated > timed_out);
        assert!((converged - 0.9).abs() < 1e-9);
    }
}
