//! Weighted multi-factor confidence scoring.
//!
//! Six deterministic factors are computed from the chosen solution, the
//! full set of solver runs, the processed constraints, and past runs of
//! similar size, then combined into a weighted overall score. Every factor
//! is pure: the same inputs always produce the same score.

use serde::{Deserialize, Serialize};

use crate::constraints::{ProcessedConstraints, Severity};
use crate::model::Solution;
use crate::types::{ConvergenceReason, ProblemContext, RunRecord, SolverRun};

use super::factors::{ConfidenceLevel, FactorScore, TrustFlags};

const W_CONSTRAINT_SATISFACTION: f64 = 0.30;
const W_PREDICTION_CONSISTENCY: f64 = 0.20;
const W_ALGORITHM_CERTAINTY: f64 = 0.20;
const W_HISTORICAL_ACCURACY: f64 = 0.15;
const W_SOLUTION_STABILITY: f64 = 0.10;
const W_COVERAGE_COMPLETENESS: f64 = 0.05;

/// Everything the scorer needs about one pipeline run.
pub struct ScoringInput<'a> {
    /// The chosen best solution.
    pub best: &'a Solution,

    /// Every solver run from the batch, failed runs included.
    pub runs: &'a [SolverRun],

    /// Processed constraints for the problem.
    pub processed: &'a ProcessedConstraints,

    /// Problem characteristics.
    pub ctx: &'a ProblemContext,

    /// Past runs of similar problem size, most recent first.
    pub similar_history: &'a [RunRecord],
}

/// Final confidence assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceResult {
    /// Weighted overall score in `[0, 1]`.
    pub overall: f64,

    /// Qualitative level for `overall`.
    pub level: ConfidenceLevel,

    /// The six factors, in weight order.
    pub factors: Vec<FactorScore>,

    /// Trust indicators.
    pub trust: TrustFlags,

    /// Human-readable risk descriptions for weak factors.
    pub risk_factors: Vec<String>,
}

impl ConfidenceResult {
    /// The value of a named factor, if present.
    pub fn factor(&self, name: &str) -> Option<f64> {
        self.factors.iter().find(|f| f.name == name).map(|f| f.value)
    }
}

/// Computes the weighted confidence assessment for one run.
pub fn score(input: &ScoringInput<'_>) -> ConfidenceResult {
    let cs = constraint_satisfaction(input.best, input.processed, input.ctx);
    let pc = prediction_consistency(input.best, input.runs);
    let ac = algorithm_certainty(input.runs, input.ctx);
    let ha = historical_accuracy(input.similar_history);
    let ss = solution_stability(input.runs);
    let cc = coverage_completeness(input.best);

    let factors = vec![
        FactorScore::new("constraint_satisfaction", cs, W_CONSTRAINT_SATISFACTION),
        FactorScore::new("prediction_consistency", pc, W_PREDICTION_CONSISTENCY),
        FactorScore::new("algorithm_certainty", ac, W_ALGORITHM_CERTAINTY),
        FactorScore::new("historical_accuracy", ha, W_HISTORICAL_ACCURACY),
        FactorScore::new("solution_stability", ss, W_SOLUTION_STABILITY),
        FactorScore::new("coverage_completeness", cc, W_COVERAGE_COMPLETENESS),
    ];

    let weight_sum: f64 = factors.iter().map(|f| f.weight).sum();
    let overall = factors
        .iter()
        .map(|f| f.value * f.weight)
        .sum::<f64>()
        / weight_sum;
    let overall = overall.clamp(0.0, 1.0);

    let trust = TrustFlags {
        reliable: cs >= 0.8,
        feasible: cc >= 0.7,
        stable: ss >= 0.7,
        experienced: ha >= 0.6,
    };

    let mut risk_factors = Vec::new();
    if cs < 0.8 {
        risk_factors.push("solution may violate important constraints".to_string());
    }
    if pc < 0.6 {
        risk_factors.push("solvers disagree on the best schedule".to_string());
    }
    if ac < 0.6 {
        risk_factors.push("solvers terminated without strong convergence".to_string());
    }
    if ha < 0.5 {
        risk_factors.push("poor track record on similar problems".to_string());
    }

    ConfidenceResult {
        overall,
        level: ConfidenceLevel::from_score(overall),
        factors,
        trust,
        risk_factors,
    }
}

fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 0.5,
        Severity::High => 0.3,
        Severity::Medium => 0.1,
    }
}

/// How well the chosen solution satisfies the constraint set.
///
/// 1.0 with no constraints; otherwise the severity-weighted violation sum
/// relative to the number of constraints, floored at zero.
fn constraint_satisfaction(
    best: &Solution,
    processed: &ProcessedConstraints,
    ctx: &ProblemContext,
) -> f64 {
    let total = processed.constraint_count();
    if total == 0 {
        return 1.0;
    }
    let breakdown = processed.breakdown(best, ctx);
    let weighted: f64 = breakdown
        .violations
        .iter()
        .map(|v| severity_weight(v.severity))
        .sum();
    (1.0 - weighted / total as f64).max(0.0)
}

/// Agreement between the solver candidates.
///
/// Blends the mean shift-level similarity of each successful candidate to
/// the chosen one with the spread of their fitness values. Identical
/// candidates with identical fitness score 1.0.
fn prediction_consistency(best: &Solution, runs: &[SolverRun]) -> f64 {
    let candidates: Vec<(&Solution, f64)> = runs
        .iter()
        .filter(|r| r.success)
        .filter_map(|r| r.solution.as_ref().map(|s| (s, r.fitness)))
        .collect();
    if candidates.is_empty() {
        return 0.0;
    }

    let mean_similarity = candidates
        .iter()
        .map(|(s, _)| best.similarity(s))
        .sum::<f64>()
        / candidates.len() as f64;

    let fitness: Vec<f64> = candidates.iter().map(|(_, f)| *f).collect();
    let spread = 1.0 - coefficient_of_variation(&fitness);

    (0.7 * mean_similarity + 0.3 * spread).clamp(0.0, 1.0)
}

fn convergence_weight(reason: ConvergenceReason) -> f64 {
    match reason {
        ConvergenceReason::Converged => 1.0,
        ConvergenceReason::Stagnation => 0.8,
        ConvergenceReason::MaxIterations => 0.7,
        ConvergenceReason::TimeLimit => 0.6,
        ConvergenceReason::Failed => 0.0,
    }
}

/// Certainty of the solver batch, from fitness weighted by how each run
/// terminated, nudged by problem complexity.
fn algorithm_certainty(runs: &[SolverRun], ctx: &ProblemContext) -> f64 {
    let successes: Vec<&SolverRun> = runs.iter().filter(|r| r.success).collect();
    if successes.is_empty() {
        return 0.5;
    }

    let weight_sum: f64 = successes
        .iter()
        .map(|r| convergence_weight(r.convergence))
        .sum();
    if weight_sum == 0.0 {
        return 0.5;
    }
    let base = successes
        .iter()
        .map(|r| (r.fitness / 100.0) * convergence_weight(r.convergence))
        .sum::<f64>()
        / weight_sum;

    let adjusted = if ctx.complexity < 0.3 {
        base * 1.05
    } else if ctx.complexity > 0.7 {
        base * 0.95
    } else {
        base
    };
    adjusted.clamp(0.0, 1.0)
}

/// Realized accuracy on past problems of similar size, with a small bonus
/// for sample depth. Defaults to 0.6 with no history.
fn historical_accuracy(similar: &[RunRecord]) -> f64 {
    if similar.is_empty() {
        return 0.6;
    }
    let mean = similar.iter().map(|r| r.accuracy).sum::<f64>() / similar.len() as f64;
    let depth_bonus = (similar.len() as f64 * 0.01).min(0.05);
    (mean + depth_bonus).clamp(0.0, 1.0)
}

/// Stability of the solver batch: how its runs terminated (converged runs
/// count for more than timed-out ones), blended with the fitness spread.
/// Defaults to 0.7 with fewer than two successful runs.
fn solution_stability(runs: &[SolverRun]) -> f64 {
    let successes: Vec<&SolverRun> = runs.iter().filter(|r| r.success).collect();
    if successes.len() < 2 {
        return 0.7;
    }

    let termination = successes
        .iter()
        .map(|r| convergence_weight(r.convergence))
        .sum::<f64>()
        / successes.len() as f64;

    let fitness: Vec<f64> = successes.iter().map(|r| r.fitness).collect();
    let spread = 1.0 - coefficient_of_variation(&fitness);

    (0.6 * termination + 0.4 * spread).clamp(0.0, 1.0)
}

/// Completeness of the chosen schedule: every slot carries a well-formed
/// value, and enough of them are working shifts to cover demand.
fn coverage_completeness(best: &Solution) -> f64 {
    if best.is_empty() {
        return 0.0;
    }
    let slots = best.len() as f64;
    let defined = best
        .values()
        .iter()
        .filter(|v| v.is_finite() && (0.0..=1.0).contains(*v))
        .count() as f64;
    let working = (0..best.staff_count())
        .flat_map(|s| (0..best.date_count()).map(move |d| (s, d)))
        .filter(|&(s, d)| best.kind_at(s, d).is_working())
        .count() as f64;

    (0.6 * (defined / slots) + 0.4 * (working / slots)).clamp(0.0, 1.0)
}

fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean.abs() < f64::EPSILON {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (variance.sqrt() / mean).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{IntegrationLayer, RawConstraints, StaffGroup};
    use crate::model::ShiftKind;
    use chrono::{NaiveDate, Utc};

    fn ctx() -> ProblemContext {
        ProblemContext::new(
            vec!["a".into(), "b".into()],
            (0..5)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + chrono::Days::new(i))
                .collect(),
        )
    }

    fn run(name: &str, solution: Solution, fitness: f64) -> SolverRun {
        SolverRun {
            algorithm: name.into(),
            success: true,
            solution: Some(solution),
            fitness,
            confidence: 0.8,
            convergence: ConvergenceReason::Converged,
            iterations: 100,
            error: None,
        }
    }

    fn input_fixture<'a>(
        best: &'a Solution,
        runs: &'a [SolverRun],
        processed: &'a ProcessedConstraints,
        ctx: &'a ProblemContext,
        history: &'a [RunRecord],
    ) -> ScoringInput<'a> {
        ScoringInput {
            best,
            runs,
            processed,
            ctx,
            similar_history: history,
        }
    }

    #[test]
    fn test_identical_candidates_score_full_consistency() {
        let ctx = ctx();
        let best = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        let runs = vec![
            run("greedy", best.clone(), 92.0),
            run("local_search", best.clone(), 92.0),
        ];
        assert!((prediction_consistency(&best, &runs) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_history_defaults() {
        assert!((historical_accuracy(&[]) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_history_depth_bonus_caps() {
        let record = RunRecord {
            staff_count: 2,
            date_count: 5,
            accuracy: 0.9,
            confidence: 0.8,
            success: true,
            finished_at: Utc::now(),
        };
        let ten = vec![record; 10];
        assert!((historical_accuracy(&ten) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_no_successful_runs_yields_neutral_certainty() {
        let ctx = ctx();
        let runs = vec![SolverRun::failed("greedy", "boom")];
        assert!((algorithm_certainty(&runs, &ctx) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_more_violations_lower_satisfaction() {
        let mut raw = RawConstraints::default();
        raw.staff_groups.push(StaffGroup {
            id: "g1".into(),
            members: vec!["a".into(), "b".into()],
            coverage: None,
            proximity: None,
        });
        let ctx = ProblemContext::analyze(
            vec!["a".into(), "b".into()],
            (0..5)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + chrono::Days::new(i))
                .collect(),
            &raw,
        );
        let processed = IntegrationLayer::new().process(&raw, &ctx);

        let clean = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        let mut one = clean.clone();
        one.set(0, 0, ShiftKind::Off.to_value());
        one.set(1, 0, ShiftKind::Off.to_value());
        let mut two = one.clone();
        two.set(0, 1, ShiftKind::Off.to_value());
        two.set(1, 1, ShiftKind::Off.to_value());

        let s0 = constraint_satisfaction(&clean, &processed, &ctx);
        let s1 = constraint_satisfaction(&one, &processed, &ctx);
        let s2 = constraint_satisfaction(&two, &processed, &ctx);
        assert!((s0 - 1.0).abs() < 1e-9);
        assert!(s1 < s0);
        assert!(s2 < s1);
    }

    #[test]
    fn test_converged_batch_is_more_stable_than_timed_out_batch() {
        let ctx = ctx();
        let best = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        let converged = vec![
            run("greedy", best.clone(), 90.0),
            run("local_search", best.clone(), 88.0),
        ];
        let mut timed_out = converged.clone();
        for r in &mut timed_out {
            r.convergence = ConvergenceReason::TimeLimit;
        }

        let stable = solution_stability(&converged);
        let shaky = solution_stability(&timed_out);
        assert!(stable > shaky);
        // Same fitness spread, so the gap is exactly the termination blend.
        assert!((stable - shaky - 0.6 * (1.0 - 0.6)).abs() < 1e-9);
    }

    #[test]
    fn test_overall_tracks_satisfaction_with_other_factors_fixed() {
        let mut raw = RawConstraints::default();
        raw.staff_groups.push(StaffGroup {
            id: "g1".into(),
            members: vec!["a".into(), "b".into()],
            coverage: None,
            proximity: None,
        });
        let ctx = ProblemContext::analyze(
            vec!["a".into(), "b".into()],
            (0..5)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + chrono::Days::new(i))
                .collect(),
            &raw,
        );
        let processed = IntegrationLayer::new().process(&raw, &ctx);

        // Same number of days off, once spread out and once clashing on one
        // date, so every factor except constraint satisfaction is identical.
        let mut spread_out = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        spread_out.set(0, 0, ShiftKind::Off.to_value());
        spread_out.set(1, 1, ShiftKind::Off.to_value());
        let mut clashing = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        clashing.set(0, 0, ShiftKind::Off.to_value());
        clashing.set(1, 0, ShiftKind::Off.to_value());

        let high = score(&input_fixture(&spread_out, &[], &processed, &ctx, &[]));
        let low = score(&input_fixture(&clashing, &[], &processed, &ctx, &[]));

        for (a, b) in high
            .factors
            .iter()
            .zip(low.factors.iter())
            .filter(|(f, _)| f.name != "constraint_satisfaction")
        {
            assert!((a.value - b.value).abs() < 1e-9);
        }
        assert!(
            high.factor("constraint_satisfaction").unwrap()
                > low.factor("constraint_satisfaction").unwrap()
        );
        assert!(high.overall > low.overall);
    }

    #[test]
    fn test_overall_is_weighted_mean() {
        let ctx = ctx();
        let raw = RawConstraints::default();
        let processed = IntegrationLayer::new().process(&raw, &ctx);
        let best = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        let runs = vec![run("greedy", best.clone(), 95.0)];

        let result = score(&input_fixture(&best, &runs, &processed, &ctx, &[]));
        assert!(result.overall > 0.0 && result.overall <= 1.0);
        assert_eq!(result.factors.len(), 6);
        let manual: f64 = result.factors.iter().map(|f| f.value * f.weight).sum();
        assert!((result.overall - manual).abs() < 1e-9);
        assert_eq!(result.level, ConfidenceLevel::from_score(result.overall));
    }

    #[test]
    fn test_risk_strings_for_weak_factors() {
        let ctx = ctx();
        let raw = RawConstraints::default();
        let processed = IntegrationLayer::new().process(&raw, &ctx);
        let best = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        let runs = vec![SolverRun::failed("greedy", "boom")];

        let result = score(&input_fixture(&best, &runs, &processed, &ctx, &[]));
        assert!(result
            .risk_factors
            .iter()
            .any(|r| r.contains("disagree")));
        assert!(result
            .risk_factors
            .iter()
            .any(|r| r.contains("convergence")));
    }
}
