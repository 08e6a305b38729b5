//! Solver registry and preset-driven selection.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use shiftwise_core::{Preset, ProblemContext, SizeCategory};

use crate::solver::{GreedySolver, LocalSearchSolver, Solver, SolverParams};

/// Errors from solver selection.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("unknown solver: {0}")]
    UnknownSolver(String),

    #[error("preset selected no solvers")]
    EmptySelection,
}

/// One selected solver with its budget.
#[derive(Clone)]
pub struct SelectedSolver {
    pub solver: Arc<dyn Solver>,
    pub params: SolverParams,
}

impl std::fmt::Debug for SelectedSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedSolver")
            .field("solver", &self.solver.name())
            .field("params", &self.params)
            .finish()
    }
}

/// Registry of available solvers, consulted by name and by preset.
///
/// Registration order is significant: it breaks fitness ties when the
/// batch winner is chosen.
pub struct SolverRegistry {
    solvers: Vec<Arc<dyn Solver>>,
}

impl SolverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            solvers: Vec::new(),
        }
    }

    /// The built-in solvers: greedy first, then stochastic local search.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GreedySolver::new()));
        registry.register(Arc::new(LocalSearchSolver::new()));
        registry
    }

    pub fn register(&mut self, solver: Arc<dyn Solver>) {
        self.solvers.push(solver);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Solver>> {
        self.solvers.iter().find(|s| s.name() == name).cloned()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.solvers.iter().map(|s| s.name()).collect()
    }

    /// Position of a solver name in registration order. Unregistered names
    /// sort last.
    pub fn rank(&self, name: &str) -> usize {
        self.solvers
            .iter()
            .position(|s| s.name() == name)
            .unwrap_or(self.solvers.len())
    }

    /// Resolves a preset into concrete solvers with size-scaled budgets.
    ///
    /// `quick` runs greedy alone; `balanced` adds local search; `best` runs
    /// greedy plus two local-search budgets. A custom preset is a
    /// comma-separated list of registered names.
    pub fn select(
        &self,
        preset: &Preset,
        ctx: &ProblemContext,
    ) -> Result<Vec<SelectedSolver>, SelectionError> {
        let params = scaled_params(ctx);

        let selected = match preset {
            Preset::Quick => vec![SelectedSolver {
                solver: self
                    .get("greedy")
                    .ok_or_else(|| SelectionError::UnknownSolver("greedy".into()))?,
                params: params.clone(),
            }],
            Preset::Balanced => {
                let mut out = Vec::new();
                for name in ["greedy", "local_search"] {
                    out.push(SelectedSolver {
                        solver: self
                            .get(name)
                            .ok_or_else(|| SelectionError::UnknownSolver(name.into()))?,
                        params: params.clone(),
                    });
                }
                out
            }
            Preset::Best => {
                let greedy = self
                    .get("greedy")
                    .ok_or_else(|| SelectionError::UnknownSolver("greedy".into()))?;
                let wide = SolverParams {
                    max_iterations: params.max_iterations * 4,
                    stagnation_limit: params.stagnation_limit * 2,
                    ..params.clone()
                };
                vec![
                    SelectedSolver {
                        solver: greedy,
                        params: params.clone(),
                    },
                    SelectedSolver {
                        solver: Arc::new(LocalSearchSolver::named("local_search")),
                        params: params.clone(),
                    },
                    SelectedSolver {
                        solver: Arc::new(LocalSearchSolver::named("local_search_wide")),
                        params: wide,
                    },
                ]
            }
            Preset::Custom(names) => {
                let mut out = Vec::new();
                for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                    out.push(SelectedSolver {
                        solver: self
                            .get(name)
                            .ok_or_else(|| SelectionError::UnknownSolver(name.to_string()))?,
                        params: params.clone(),
                    });
                }
                out
            }
        };

        if selected.is_empty() {
            return Err(SelectionError::EmptySelection);
        }
        Ok(selected)
    }
}

impl Default for SolverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Budgets grow with problem size.
fn scaled_params(ctx: &ProblemContext) -> SolverParams {
    let base = SolverParams::default();
    let factor = match ctx.size_category {
        SizeCategory::Small => 1,
        SizeCategory::Medium => 2,
        SizeCategory::Large => 4,
        SizeCategory::VeryLarge => 8,
    };
    SolverParams {
        max_iterations: base.max_iterations * factor,
        max_runtime: base.max_runtime + Duration::from_secs(10 * (factor - 1)),
        stagnation_limit: base.stagnation_limit * factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx(staff: usize, dates: usize) -> ProblemContext {
        ProblemContext::new(
            (0..staff).map(|i| format!("s{}", i)).collect(),
            (0..dates)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + chrono::Days::new(i as u64))
                .collect(),
        )
    }

    #[test]
    fn test_presets_select_expected_counts() {
        let registry = SolverRegistry::with_defaults();
        let ctx = ctx(4, 7);

        assert_eq!(registry.select(&Preset::Quick, &ctx).unwrap().len(), 1);
        assert_eq!(registry.select(&Preset::Balanced, &ctx).unwrap().len(), 2);
        assert_eq!(registry.select(&Preset::Best, &ctx).unwrap().len(), 3);
    }

    #[test]
    fn test_custom_preset_resolves_names() {
        let registry = SolverRegistry::with_defaults();
        let ctx = ctx(4, 7);

        let selected = registry
            .select(&Preset::Custom("local_search, greedy".into()), &ctx)
            .unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].solver.name(), "local_search");

        let err = registry
            .select(&Preset::Custom("simulated_annealing".into()), &ctx)
            .unwrap_err();
        assert!(matches!(err, SelectionError::UnknownSolver(_)));
    }

    #[test]
    fn test_empty_custom_preset_is_an_error() {
        let registry = SolverRegistry::with_defaults();
        let err = registry
            .select(&Preset::Custom(" , ".into()), &ctx(2, 3))
            .unwrap_err();
        assert!(matches!(err, SelectionError::EmptySelection));
    }

    #[test]
    fn test_budgets_scale_with_size() {
        let small = scaled_params(&ctx(2, 5));
        let large = scaled_params(&ctx(20, 30));
        assert!(large.max_iterations > small.max_iterations);
        assert!(large.max_runtime > small.max_runtime);
    }

    #[test]
    fn test_rank_follows_registration_order() {
        let registry = SolverRegistry::with_defaults();
        assert_eq!(registry.rank("greedy"), 0);
        assert_eq!(registry.rank("local_search"), 1);
        assert_eq!(registry.rank("nonexistent"), 2);
    }
}
