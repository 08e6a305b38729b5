//! Shared types: problem characteristics, solver run records, run history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constraints::RawConstraints;
use crate::model::Solution;

/// Size category of a scheduling problem, by slot count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeCategory {
    /// Fewer than 50 slots.
    Small,
    /// Fewer than 200 slots.
    Medium,
    /// Fewer than 500 slots.
    Large,
    /// 500 slots or more.
    VeryLarge,
}

impl SizeCategory {
    /// Classifies a slot count.
    pub fn from_slots(slots: usize) -> Self {
        if slots < 50 {
            SizeCategory::Small
        } else if slots < 200 {
            SizeCategory::Medium
        } else if slots < 500 {
            SizeCategory::Large
        } else {
            SizeCategory::VeryLarge
        }
    }
}

/// Characteristics of one scheduling problem, shared by constraint
/// evaluators, the orchestrator, and the confidence scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemContext {
    /// Staff identifiers, in roster order. Row order of every `Solution`.
    pub staff_ids: Vec<String>,

    /// Calendar dates, in range order. Column order of every `Solution`.
    pub dates: Vec<NaiveDate>,

    /// Complexity estimate in `[0, 1]`, from problem size, constraint
    /// density, and staff-group count.
    pub complexity: f64,

    /// Size category by slot count.
    pub size_category: SizeCategory,

    /// Rough optimization-time estimate in milliseconds.
    pub estimated_runtime_ms: u64,
}

impl ProblemContext {
    /// Builds a context with no constraint information (complexity from
    /// size alone).
    pub fn new(staff_ids: Vec<String>, dates: Vec<NaiveDate>) -> Self {
        Self::analyze(staff_ids, dates, &RawConstraints::default())
    }

    /// Builds a context from the roster, date range, and raw constraints.
    pub fn analyze(staff_ids: Vec<String>, dates: Vec<NaiveDate>, raw: &RawConstraints) -> Self {
        let slots = staff_ids.len() * dates.len();
        let density = if slots == 0 {
            0.0
        } else {
            (raw.record_count() as f64 / slots as f64).min(1.0)
        };
        let size_factor = (slots as f64 / 500.0).min(1.0);
        let group_factor = (raw.staff_groups.len() as f64 / 10.0).min(1.0);
        let complexity = 0.4 * size_factor + 0.4 * density + 0.2 * group_factor;
        let estimated_runtime_ms = ((slots as f64) * 2.0 * (1.0 + complexity)).ceil() as u64;

        Self {
            staff_ids,
            dates,
            complexity,
            size_category: SizeCategory::from_slots(slots),
            estimated_runtime_ms,
        }
    }

    /// Total number of (staff, date) slots.
    pub fn slot_count(&self) -> usize {
        self.staff_ids.len() * self.dates.len()
    }

    /// Index of a staff id in roster order.
    pub fn staff_index(&self, staff_id: &str) -> Option<usize> {
        self.staff_ids.iter().position(|s| s == staff_id)
    }

    /// Index of a date in range order.
    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.iter().position(|d| *d == date)
    }
}

/// Why a solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceReason {
    /// Search converged on an optimum.
    Converged,
    /// Iteration cap reached.
    MaxIterations,
    /// Wall-clock cap reached.
    TimeLimit,
    /// No fitness improvement for the stagnation window.
    Stagnation,
    /// The solver failed before producing a result.
    Failed,
}

/// Outcome of one solver invocation, successful or not.
///
/// Failed invocations are recorded with `success: false`, zero fitness, and
/// no solution; they never abort the batch they ran in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverRun {
    /// Registered solver name.
    pub algorithm: String,

    /// Whether the solver returned a result.
    pub success: bool,

    /// The produced candidate, if any.
    pub solution: Option<Solution>,

    /// Solver-reported fitness in `[0, 100]`.
    pub fitness: f64,

    /// Solver-reported confidence in `[0, 1]`.
    pub confidence: f64,

    /// Termination reason.
    pub convergence: ConvergenceReason,

    /// Iterations performed.
    pub iterations: u64,

    /// Error message for failed runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SolverRun {
    /// Records a failed invocation as a zero-fitness run.
    pub fn failed(algorithm: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            success: false,
            solution: None,
            fitness: 0.0,
            confidence: 0.0,
            convergence: ConvergenceReason::Failed,
            iterations: 0,
            error: Some(error.into()),
        }
    }
}

/// One completed pipeline run, kept in bounded history for analytics and
/// the historical-accuracy confidence factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Staff count of the problem.
    pub staff_count: usize,

    /// Date count of the problem.
    pub date_count: usize,

    /// Realized accuracy in `[0, 1]` (validated fitness / 100).
    pub accuracy: f64,

    /// Overall confidence reported for the run.
    pub confidence: f64,

    /// Whether the run completed successfully.
    pub success: bool,

    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl RunRecord {
    /// Whether this record comes from a problem of similar size:
    /// staff-count difference ≤ 3 and date-count difference ≤ 7.
    pub fn is_similar(&self, staff_count: usize, date_count: usize) -> bool {
        self.staff_count.abs_diff(staff_count) <= 3 && self.date_count.abs_diff(date_count) <= 7
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + chrono::Days::new(i as u64))
            .collect()
    }

    #[test]
    fn test_size_categories() {
        assert_eq!(SizeCategory::from_slots(0), SizeCategory::Small);
        assert_eq!(SizeCategory::from_slots(49), SizeCategory::Small);
        assert_eq!(SizeCategory::from_slots(50), SizeCategory::Medium);
        assert_eq!(SizeCategory::from_slots(199), SizeCategory::Medium);
        assert_eq!(SizeCategory::from_slots(200), SizeCategory::Large);
        assert_eq!(SizeCategory::from_slots(499), SizeCategory::Large);
        assert_eq!(SizeCategory::from_slots(500), SizeCategory::VeryLarge);
    }

    #[test]
    fn test_context_indices() {
        let ctx = ProblemContext::new(vec!["a".into(), "b".into()], dates(5));
        assert_eq!(ctx.slot_count(), 10);
        assert_eq!(ctx.staff_index("b"), Some(1));
        assert_eq!(ctx.staff_index("z"), None);
        assert_eq!(ctx.date_index(ctx.dates[3]), Some(3));
    }

    #[test]
    fn test_complexity_bounded() {
        let ctx = ProblemContext::new(vec!["a".into(); 100], dates(30));
        assert!(ctx.complexity >= 0.0 && ctx.complexity <= 1.0);
        assert_eq!(ctx.size_category, SizeCategory::VeryLarge);
    }

    #[test]
    fn test_run_record_similarity() {
        let record = RunRecord {
            staff_count: 10,
            date_count: 30,
            accuracy: 0.9,
            confidence: 0.8,
            success: true,
            finished_at: Utc::now(),
        };
        assert!(record.is_similar(13, 37));
        assert!(!record.is_similar(14, 30));
        assert!(!record.is_similar(10, 38));
    }
}
