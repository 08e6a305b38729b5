//! Post-processing of the winning candidate: bounded repair, ensemble
//! merging, and alternative selection.

use shiftwise_core::{
    validate_solution, ObjectiveFn, ProblemContext, ProcessedConstraints, Severity, ShiftKind,
    Solution, SolverRun, ValidationReport,
};

use crate::result::Alternative;

/// Tie-break preference for ensemble votes, strongest first.
const VOTE_PREFERENCE: [ShiftKind; 4] = [
    ShiftKind::Normal,
    ShiftKind::Late,
    ShiftKind::Early,
    ShiftKind::Off,
];

/// Whether the winner is weak enough to attempt repair.
pub fn needs_repair(report: &ValidationReport, fitness: f64, threshold: f64) -> bool {
    !report.valid || fitness < threshold
}

/// Bounded repair of a weak winner.
///
/// Each pass re-optimizes only the slots implicated in critical violations,
/// trying every shift kind and keeping the best. Stops early once the
/// candidate validates above the threshold. Returns the improved solution
/// and its fitness; the input is returned unchanged when no pass helps.
pub fn repair(
    solution: &Solution,
    processed: &ProcessedConstraints,
    ctx: &ProblemContext,
    objective: &ObjectiveFn,
    attempts: usize,
    threshold: f64,
) -> (Solution, f64) {
    let mut current = solution.clone();
    let mut fitness = objective(&current);

    for attempt in 0..attempts {
        let report = validate_solution(&current, processed, ctx);
        if report.valid && fitness >= threshold {
            break;
        }

        let slots = implicated_slots(&report, ctx);
        if slots.is_empty() {
            break;
        }
        tracing::debug!(
            attempt,
            slots = slots.len(),
            fitness,
            "repairing violated slots"
        );

        let mut improved = false;
        for (staff, date) in slots {
            let original = current.get(staff, date);
            let mut best_value = original;
            let mut best_fitness = fitness;
            for kind in ShiftKind::all() {
                current.set(staff, date, kind.to_value());
                let candidate = objective(&current);
                if candidate > best_fitness {
                    best_fitness = candidate;
                    best_value = kind.to_value();
                }
            }
            current.set(staff, date, best_value);
            if best_fitness > fitness {
                fitness = best_fitness;
                improved = true;
            }
        }

        if !improved {
            break;
        }
    }

    (current, fitness)
}

/// Slots named by critical violations. A violation carrying only a date
/// implicates that date for every staff member, and vice versa.
fn implicated_slots(report: &ValidationReport, ctx: &ProblemContext) -> Vec<(usize, usize)> {
    let mut slots = Vec::new();
    for violation in report.violations_of(Severity::Critical) {
        let staff = violation
            .staff_id
            .as_deref()
            .and_then(|id| ctx.staff_index(id));
        let date = violation.date.and_then(|d| ctx.date_index(d));
        match (staff, date) {
            (Some(s), Some(d)) => slots.push((s, d)),
            (Some(s), None) => slots.extend((0..ctx.dates.len()).map(|d| (s, d))),
            (None, Some(d)) => slots.extend((0..ctx.staff_ids.len()).map(|s| (s, d))),
            (None, None) => {}
        }
    }
    slots.sort_unstable();
    slots.dedup();
    slots
}

/// Fitness-weighted per-slot vote across all successful candidates.
///
/// Every candidate votes for its discretized kind at each slot, weighted by
/// its fitness. Ties prefer normal, then late, then early, then off.
/// Returns `None` with fewer than two candidates.
pub fn ensemble_merge(runs: &[SolverRun], ctx: &ProblemContext) -> Option<Solution> {
    let candidates: Vec<(&Solution, f64)> = runs
        .iter()
        .filter(|r| r.success)
        .filter_map(|r| r.solution.as_ref().map(|s| (s, r.fitness.max(1.0))))
        .collect();
    if candidates.len() < 2 {
        return None;
    }

    let staff_count = ctx.staff_ids.len();
    let date_count = ctx.dates.len();
    let mut merged = Solution::from_values(
        vec![ShiftKind::Normal.to_value(); staff_count * date_count],
        staff_count,
        date_count,
    );

    for staff in 0..staff_count {
        for date in 0..date_count {
            let mut votes = [0.0f64; 4];
            for (solution, weight) in &candidates {
                let kind = solution.kind_at(staff, date);
                let idx = VOTE_PREFERENCE.iter().position(|k| *k == kind).unwrap_or(0);
                votes[idx] += weight;
            }
            // First index wins ties because VOTE_PREFERENCE is ordered.
            let winner = votes
                .iter()
                .enumerate()
                .max_by(|(ia, a), (ib, b)| {
                    a.partial_cmp(b)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(ib.cmp(ia))
                })
                .map(|(i, _)| i)
                .unwrap_or(0);
            merged.set(staff, date, VOTE_PREFERENCE[winner].to_value());
        }
    }

    Some(merged)
}

/// Up to three runner-up schedules: non-winning successful candidates by
/// fitness, plus the ensemble merge when it differs from the winner. Each
/// carries its own estimated confidence and a one-line trade-off summary.
pub fn alternatives(
    best: &Solution,
    runs: &[SolverRun],
    ctx: &ProblemContext,
    objective: &ObjectiveFn,
) -> Vec<Alternative> {
    let best_fitness = objective(best);
    let mut out = Vec::new();

    if let Some(merged) = ensemble_merge(runs, ctx) {
        if merged.similarity(best) < 1.0 {
            out.push(annotate(
                "ensemble",
                &merged,
                objective(&merged),
                best,
                best_fitness,
                ctx,
            ));
        }
    }

    let mut runners: Vec<(&SolverRun, &Solution)> = runs
        .iter()
        .filter(|r| r.success)
        .filter_map(|r| r.solution.as_ref().map(|s| (r, s)))
        .collect();
    runners.sort_by(|(a, _), (b, _)| {
        b.fitness
            .partial_cmp(&a.fitness)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for (run, solution) in runners {
        if out.len() >= 3 {
            break;
        }
        if solution.similarity(best) >= 1.0 {
            continue;
        }
        out.push(annotate(
            &run.algorithm,
            solution,
            run.fitness,
            best,
            best_fitness,
            ctx,
        ));
    }

    out.truncate(3);
    out
}

/// Candidate confidence is estimated from its own fitness blended with how
/// closely it tracks the winner.
fn annotate(
    source: &str,
    solution: &Solution,
    fitness: f64,
    best: &Solution,
    best_fitness: f64,
    ctx: &ProblemContext,
) -> Alternative {
    let similarity = solution.similarity(best);
    Alternative {
        source: source.to_string(),
        fitness,
        similarity_to_best: similarity,
        confidence: (0.7 * (fitness / 100.0) + 0.3 * similarity).clamp(0.0, 1.0),
        tradeoff: format!(
            "fitness {:.1} vs {:.1} for the winner, {:.0}% identical slots",
            fitness,
            best_fitness,
            similarity * 100.0
        ),
        schedule: solution.to_schedule(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shiftwise_core::{ConvergenceReason, IntegrationLayer, RawConstraints, StaffGroup};

    fn ctx_with_group() -> (RawConstraints, ProblemContext) {
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
        (raw, ctx)
    }

    fn run(name: &str, solution: Solution, fitness: f64) -> SolverRun {
        SolverRun {
            algorithm: name.into(),
            success: true,
            solution: Some(solution),
            fitness,
            confidence: 0.8,
            convergence: ConvergenceReason::Converged,
            iterations: 10,
            error: None,
        }
    }

    #[test]
    fn test_repair_fixes_group_conflict() {
        let (raw, ctx) = ctx_with_group();
        let processed = IntegrationLayer::new().process(&raw, &ctx);
        let objective = processed.objective.clone();

        let mut broken = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        broken.set(0, 1, ShiftKind::Off.to_value());
        broken.set(1, 1, ShiftKind::Off.to_value());
        assert!(!validate_solution(&broken, &processed, &ctx).valid);

        let (repaired, fitness) = repair(&broken, &processed, &ctx, &objective, 2, 85.0);
        assert!(validate_solution(&repaired, &processed, &ctx).valid);
        assert!(fitness > objective(&broken));
    }

    #[test]
    fn test_ensemble_majority_wins() {
        let (_, ctx) = ctx_with_group();
        let normal = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        let mut late = normal.clone();
        late.set(0, 0, ShiftKind::Late.to_value());

        let runs = vec![
            run("a", late.clone(), 90.0),
            run("b", late.clone(), 90.0),
            run("c", normal.clone(), 90.0),
        ];
        let merged = ensemble_merge(&runs, &ctx).unwrap();
        assert_eq!(merged.kind_at(0, 0), ShiftKind::Late);
        assert_eq!(merged.kind_at(1, 0), ShiftKind::Normal);
    }

    #[test]
    fn test_ensemble_tie_prefers_normal() {
        let (_, ctx) = ctx_with_group();
        let normal = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        let mut late = normal.clone();
        late.set(0, 0, ShiftKind::Late.to_value());

        let runs = vec![run("a", late, 90.0), run("b", normal, 90.0)];
        let merged = ensemble_merge(&runs, &ctx).unwrap();
        assert_eq!(merged.kind_at(0, 0), ShiftKind::Normal);
    }

    #[test]
    fn test_single_candidate_has_no_ensemble() {
        let (_, ctx) = ctx_with_group();
        let normal = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        assert!(ensemble_merge(&[run("a", normal, 90.0)], &ctx).is_none());
    }

    #[test]
    fn test_alternatives_capped_and_distinct() {
        let (raw, ctx) = ctx_with_group();
        let processed = IntegrationLayer::new().process(&raw, &ctx);
        let objective = processed.objective.clone();

        let best = Solution::filled(&ctx, ShiftKind::Normal.to_value());
        let mut runs = vec![run("winner", best.clone(), 95.0)];
        for (i, date) in [0usize, 1, 2, 3].iter().enumerate() {
            let mut other = best.clone();
            other.set(0, *date, ShiftKind::Late.to_value());
            runs.push(run(&format!("alt{}", i), other, 90.0 - i as f64));
        }

        let alts = alternatives(&best, &runs, &ctx, &objective);
        assert!(alts.len() <= 3);
        assert!(alts.iter().all(|a| a.similarity_to_best < 1.0));
        for alt in &alts {
            assert!((0.0..=1.0).contains(&alt.confidence));
            assert!(alt.tradeoff.contains("winner"));
        }
    }
}
