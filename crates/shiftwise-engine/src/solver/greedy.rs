//! Deterministic coordinate-ascent solver.

use std::time::Instant;

use async_trait::async_trait;

use shiftwise_core::{ConvergenceReason, ShiftKind, Solution};

use super::{self_confidence, SolveRequest, Solver, SolverError, SolverSolution};

/// Greedy coordinate ascent: sweeps every slot, trying each shift kind and
/// keeping the best, until a full sweep improves nothing. Deterministic for
/// a given seed and objective.
pub struct GreedySolver;

impl GreedySolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GreedySolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Solver for GreedySolver {
    fn name(&self) -> &str {
        "greedy"
    }

    async fn solve(&self, req: &SolveRequest) -> Result<SolverSolution, SolverError> {
        let started = Instant::now();
        let mut current = req.seed.clone();
        let mut fitness = (req.objective)(&current);
        let mut iterations = 0u64;
        let mut convergence = ConvergenceReason::Converged;

        'outer: loop {
            let mut improved = false;

            for staff in 0..current.staff_count() {
                for date in 0..current.date_count() {
                    iterations += 1;
                    if iterations >= req.params.max_iterations {
                        convergence = ConvergenceReason::MaxIterations;
                        break 'outer;
                    }
                    if started.elapsed() >= req.params.max_runtime {
                        convergence = ConvergenceReason::TimeLimit;
                        break 'outer;
                    }

                    let original = current.get(staff, date);
                    let mut best_value = original;
                    let mut best_fitness = fitness;
                    for kind in ShiftKind::all() {
                        let value = kind.to_value();
                        if value == original {
                            continue;
                        }
                        current.set(staff, date, value);
                        let candidate = (req.objective)(&current);
                        if candidate > best_fitness {
                            best_fitness = candidate;
                            best_value = value;
                        }
                    }
                    current.set(staff, date, best_value);
                    if best_fitness > fitness {
                        fitness = best_fitness;
                        improved = true;
                    }
                }
            }

            if !improved {
                break;
            }
        }

        Ok(candidate(current, fitness, convergence, iterations))
    }
}

fn candidate(
    solution: Solution,
    fitness: f64,
    convergence: ConvergenceReason,
    iterations: u64,
) -> SolverSolution {
    SolverSolution {
        confidence: self_confidence(fitness, convergence),
        solution,
        fitness,
        convergence,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SolverParams;
    use chrono::NaiveDate;
    use shiftwise_core::{
        IntegrationLayer, ProblemContext, RawConstraints, StaffGroup,
    };

    fn request() -> SolveRequest {
        let mut raw = RawConstraints::default();
        raw.staff_groups.push(StaffGroup {
            id: "g1".into(),
            members: vec!["a".into(), "b".into()],
            coverage: None,
            proximity: None,
        });
        let ctx = ProblemContext::analyze(
            vec!["a".into(), "b".into()],
            (0..4)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + chrono::Days::new(i))
                .collect(),
            &raw,
        );
        let processed = IntegrationLayer::new().process(&raw, &ctx);
        let objective = processed.objective.clone();

        // Seed with both group members off everywhere: maximally conflicted.
        let seed = Solution::filled(&ctx, ShiftKind::Off.to_value());
        SolveRequest {
            ctx,
            seed,
            objective,
            params: SolverParams::default(),
        }
    }

    #[tokio::test]
    async fn test_greedy_repairs_conflicted_seed() {
        let req = request();
        let start_fitness = (req.objective)(&req.seed);

        let result = GreedySolver::new().solve(&req).await.unwrap();
        assert!(result.fitness > start_fitness);
        assert_eq!(result.convergence, ConvergenceReason::Converged);
        assert!(result.iterations > 0);
        assert!(result.confidence > 0.0);
    }

    #[tokio::test]
    async fn test_greedy_is_deterministic() {
        let req = request();
        let a = GreedySolver::new().solve(&req).await.unwrap();
        let b = GreedySolver::new().solve(&req).await.unwrap();
        assert_eq!(a.fitness, b.fitness);
        assert_eq!(a.solution.values(), b.solution.values());
    }

    #[tokio::test]
    async fn test_greedy_respects_iteration_cap() {
        let mut req = request();
        req.params.max_iterations = 5;
        let result = GreedySolver::new().solve(&req).await.unwrap();
        assert_eq!(result.convergence, ConvergenceReason::MaxIterations);
        assert!(result.iterations <= 5);
    }
}
