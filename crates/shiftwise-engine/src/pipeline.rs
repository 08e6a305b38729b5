//! The six-stage scheduling pipeline.
//!
//! Stages run in a fixed order: preprocessing, algorithm selection,
//! optimization, validation, postprocessing, finalization. A failure in
//! any stage short-circuits to the fallback path, which returns the
//! caller's existing schedule with sharply reduced confidence instead of
//! erroring out.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use thiserror::Error;

use shiftwise_core::{
    confidence, validate_solution, IntegrationLayer, ProblemContext, ProcessedConstraints,
    RunRecord, ScheduleRequest, Solution, SolverRun,
};

use crate::cache::ConstraintCache;
use crate::config::EngineConfig;
use crate::context::{ExecutionContext, StageName};
use crate::postprocess;
use crate::result::{PipelineOutcome, Recommendation, RunMetadata};
use crate::selection::{SelectedSolver, SolverRegistry};
use crate::solver::SolveRequest;

/// Confidence assigned to a fallback schedule.
const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Errors that abort a stage and trigger the fallback path.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] shiftwise_core::RequestError),

    #[error(transparent)]
    Selection(#[from] crate::selection::SelectionError),

    #[error("every solver in the batch failed")]
    AllSolversFailed,
}

/// The scheduling pipeline. Cheap to share: cache and history live behind
/// `Arc` so concurrent runs see the same state.
pub struct Pipeline {
    config: EngineConfig,
    registry: Arc<SolverRegistry>,
    cache: Arc<ConstraintCache>,
    history: Arc<crate::history::ExecutionHistory>,
}

impl Pipeline {
    pub fn new(config: EngineConfig) -> Self {
        let cache = Arc::new(ConstraintCache::new(
            config.cache_capacity,
            config.cache_ttl,
        ));
        let history = Arc::new(crate::history::ExecutionHistory::new(
            config.history_capacity,
        ));
        Self {
            config,
            registry: Arc::new(SolverRegistry::with_defaults()),
            cache,
            history,
        }
    }

    /// Replaces the solver registry. Used to run custom solvers.
    pub fn with_registry(mut self, registry: SolverRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Shared run history.
    pub fn history(&self) -> &crate::history::ExecutionHistory {
        &self.history
    }

    /// Runs the full pipeline for one request.
    ///
    /// Never returns an error: any stage failure produces a fallback
    /// outcome built from the request's existing schedule.
    pub async fn run(&self, request: &ScheduleRequest) -> PipelineOutcome {
        let mut exec = ExecutionContext::new();
        tracing::info!(run_id = %exec.run_id, preset = %request.preset, "pipeline starting");

        match self.run_stages(request, &mut exec).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let stage = exec.reached_stage();
                tracing::warn!(
                    run_id = %exec.run_id,
                    stage = ?stage,
                    error = %err,
                    "pipeline failed, falling back to existing schedule"
                );
                self.fallback(request, exec, &err)
            }
        }
    }

    async fn run_stages(
        &self,
        request: &ScheduleRequest,
        exec: &mut ExecutionContext,
    ) -> Result<PipelineOutcome, PipelineError> {
        // Stage 1: preprocessing. Request shape, problem analysis, and
        // constraint integration (cached by content fingerprint).
        let started = Instant::now();
        let ctx = match request.validate() {
            Ok(()) => ProblemContext::analyze(
                request.staff_ids(),
                request.dates.clone(),
                &request.constraints,
            ),
            Err(e) => {
                exec.record_failure(StageName::Preprocessing, ms(started), e.to_string());
                return Err(e.into());
            }
        };
        let (processed, cache_hit) = match self.cache.get(&request.constraints, &ctx).await {
            Some(processed) => (processed, true),
            None => {
                let layer = IntegrationLayer::new()
                    .with_performance_multiplier(self.history.performance_multiplier());
                let processed = layer.process(&request.constraints, &ctx);
                self.cache
                    .insert(&request.constraints, &ctx, processed.clone())
                    .await;
                (processed, false)
            }
        };
        exec.record(StageName::Preprocessing, ms(started));

        // Stage 2: algorithm selection.
        let started = Instant::now();
        let selected = match self.registry.select(&request.preset, &ctx) {
            Ok(selected) => selected,
            Err(e) => {
                exec.record_failure(StageName::AlgorithmSelection, ms(started), e.to_string());
                return Err(e.into());
            }
        };
        tracing::debug!(
            run_id = %exec.run_id,
            solvers = ?selected.iter().map(|s| s.solver.name()).collect::<Vec<_>>(),
            "solvers selected"
        );
        exec.record(StageName::AlgorithmSelection, ms(started));

        // Stage 3: optimization.
        let started = Instant::now();
        let seed = request.existing_schedule.to_solution(&ctx);
        let max_concurrent = request
            .options
            .max_concurrent_solvers
            .unwrap_or(self.config.max_concurrent_solvers)
            .max(1);
        let runs = self
            .run_solvers(&selected, &ctx, &seed, &processed, max_concurrent)
            .await;

        let best_run = self.pick_best(&runs);
        let (best, fitness) = match best_run {
            Some(run) => (run.solution.clone().unwrap_or_else(|| seed.clone()), run.fitness),
            None => {
                exec.record_failure(
                    StageName::Optimization,
                    ms(started),
                    "every solver in the batch failed",
                );
                return Err(PipelineError::AllSolversFailed);
            }
        };
        exec.record(StageName::Optimization, ms(started));

        // Stage 4: validation. Hard-constraint check plus confidence
        // scoring over the whole batch.
        let started = Instant::now();
        let mut best = best;
        let mut fitness = fitness;
        let mut report = validate_solution(&best, &processed, &ctx);
        let similar = self.history.similar(ctx.staff_ids.len(), ctx.dates.len());
        let mut scored = confidence::score(&confidence::ScoringInput {
            best: &best,
            runs: &runs,
            processed: &processed,
            ctx: &ctx,
            similar_history: &similar,
        });
        exec.record(StageName::Validation, ms(started));

        // Stage 5: postprocessing. Bounded repair of a weak winner,
        // alternatives, and the recommendation list.
        let started = Instant::now();
        if postprocess::needs_repair(&report, fitness, self.config.repair_threshold) {
            let (repaired, repaired_fitness) = postprocess::repair(
                &best,
                &processed,
                &ctx,
                &processed.objective,
                self.config.repair_attempts,
                self.config.repair_threshold,
            );
            if repaired_fitness > fitness {
                best = repaired;
                fitness = repaired_fitness;
                report = validate_solution(&best, &processed, &ctx);
                scored = confidence::score(&confidence::ScoringInput {
                    best: &best,
                    runs: &runs,
                    processed: &processed,
                    ctx: &ctx,
                    similar_history: &similar,
                });
            }
        }
        let alternatives = postprocess::alternatives(&best, &runs, &ctx, &processed.objective);
        let recommendations = Recommendation::build(scored.overall, Some(&report));
        exec.record(StageName::Postprocessing, ms(started));

        // Stage 6: finalization.
        Ok(self.finalize(
            request,
            exec,
            ctx,
            best,
            fitness,
            report,
            scored,
            recommendations,
            alternatives,
            runs,
            cache_hit,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn finalize(
        &self,
        request: &ScheduleRequest,
        exec: &mut ExecutionContext,
        ctx: ProblemContext,
        best: Solution,
        fitness: f64,
        report: shiftwise_core::ValidationReport,
        scored: shiftwise_core::ConfidenceResult,
        recommendations: Vec<Recommendation>,
        alternatives: Vec<crate::result::Alternative>,
        runs: Vec<SolverRun>,
        cache_hit: bool,
    ) -> PipelineOutcome {
        let started = Instant::now();

        let accuracy = (fitness / 100.0).clamp(0.0, 1.0);
        self.history.record(RunRecord {
            staff_count: ctx.staff_ids.len(),
            date_count: ctx.dates.len(),
            accuracy,
            confidence: scored.overall,
            success: report.valid,
            finished_at: Utc::now(),
        });

        exec.record(StageName::Finalization, ms(started));
        tracing::info!(
            run_id = %exec.run_id,
            fitness,
            confidence = scored.overall,
            valid = report.valid,
            elapsed_ms = exec.elapsed_ms(),
            "pipeline finished"
        );

        let overall = scored.overall;
        let violation_count = report.violations.len();
        let algorithms: Vec<String> = runs.iter().map(|r| r.algorithm.clone()).collect();
        PipelineOutcome {
            success: true,
            schedule: best.to_schedule(&ctx),
            fitness,
            validation: Some(report),
            confidence: Some(scored),
            overall_confidence: overall,
            error: None,
            recommendations,
            alternatives,
            solver_runs: runs,
            metadata: RunMetadata {
                run_id: exec.run_id.clone(),
                started_at: exec.started_at,
                elapsed_ms: exec.elapsed_ms(),
                stages: exec.stages.clone(),
                preset: request.preset.to_string(),
                algorithms,
                accuracy,
                violation_count,
                cache_hit,
                fallback: false,
            },
        }
    }

    /// Runs the selected solvers in bounded-concurrency batches. A solver
    /// failure or timeout becomes a failed run entry; it never aborts the
    /// batch.
    async fn run_solvers(
        &self,
        selected: &[SelectedSolver],
        ctx: &ProblemContext,
        seed: &Solution,
        processed: &ProcessedConstraints,
        max_concurrent: usize,
    ) -> Vec<SolverRun> {
        let mut runs = Vec::with_capacity(selected.len());

        for batch in selected.chunks(max_concurrent) {
            let futures = batch.iter().map(|s| {
                let req = SolveRequest {
                    ctx: ctx.clone(),
                    seed: seed.clone(),
                    objective: processed.objective.clone(),
                    params: s.params.clone(),
                };
                let solver = s.solver.clone();
                let timeout = self.config.solver_timeout.max(s.params.max_runtime);
                async move {
                    let name = solver.name().to_string();
                    match tokio::time::timeout(timeout, solver.solve(&req)).await {
                        Ok(Ok(candidate)) => SolverRun {
                            algorithm: name,
                            success: true,
                            solution: Some(candidate.solution),
                            fitness: candidate.fitness,
                            confidence: candidate.confidence,
                            convergence: candidate.convergence,
                            iterations: candidate.iterations,
                            error: None,
                        },
                        Ok(Err(e)) => {
                            tracing::warn!(solver = %name, error = %e, "solver failed");
                            SolverRun::failed(name, e.to_string())
                        }
                        Err(_) => {
                            tracing::warn!(solver = %name, ?timeout, "solver timed out");
                            SolverRun::failed(name, format!("timed out after {:?}", timeout))
                        }
                    }
                }
            });
            runs.extend(join_all(futures).await);
        }

        runs
    }

    /// Best successful run by fitness; registry registration order breaks
    /// exact ties.
    fn pick_best<'a>(&self, runs: &'a [SolverRun]) -> Option<&'a SolverRun> {
        runs.iter()
            .filter(|r| r.success && r.solution.is_some())
            .min_by(|a, b| {
                b.fitness
                    .partial_cmp(&a.fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| {
                        self.registry
                            .rank(&a.algorithm)
                            .cmp(&self.registry.rank(&b.algorithm))
                    })
            })
    }

    /// Builds the degraded outcome for a failed run: the existing schedule,
    /// zero fitness, a fixed low confidence, and the triggering error.
    fn fallback(
        &self,
        request: &ScheduleRequest,
        exec: ExecutionContext,
        err: &PipelineError,
    ) -> PipelineOutcome {
        PipelineOutcome {
            success: false,
            schedule: request.existing_schedule.clone(),
            fitness: 0.0,
            validation: None,
            confidence: None,
            overall_confidence: FALLBACK_CONFIDENCE,
            error: Some(err.to_string()),
            recommendations: vec![Recommendation::for_confidence(FALLBACK_CONFIDENCE)],
            alternatives: Vec::new(),
            solver_runs: Vec::new(),
            metadata: RunMetadata {
                run_id: exec.run_id.clone(),
                started_at: exec.started_at,
                elapsed_ms: exec.elapsed_ms(),
                stages: exec.stages,
                preset: request.preset.to_string(),
                algorithms: Vec::new(),
                accuracy: 0.0,
                violation_count: 0,
                cache_hit: false,
                fallback: true,
            },
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use shiftwise_core::{Preset, Schedule, Staff, StaffGroup};

    use crate::context::StageStatus;
    use crate::solver::{Solver, SolverError, SolverSolution};

    struct FailingSolver;

    #[async_trait]
    impl Solver for FailingSolver {
        fn name(&self) -> &str {
            "failing"
        }

        async fn solve(&self, _req: &SolveRequest) -> Result<SolverSolution, SolverError> {
            Err(SolverError::Internal("intentional".into()))
        }
    }

    fn request() -> ScheduleRequest {
        let mut request = ScheduleRequest {
            staff: vec![
                Staff::new("a", "Alice"),
                Staff::new("b", "Bob"),
            ],
            dates: (0..4)
                .map(|i| NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() + chrono::Days::new(i))
                .collect(),
            constraints: Default::default(),
            existing_schedule: Schedule::new(),
            preset: Preset::Quick,
            options: Default::default(),
        };
        request.constraints.staff_groups.push(StaffGroup {
            id: "g1".into(),
            members: vec!["a".into(), "b".into()],
            coverage: None,
            proximity: None,
        });
        request
    }

    #[tokio::test]
    async fn test_successful_run_walks_all_six_stages() {
        let pipeline = Pipeline::default();
        let outcome = pipeline.run(&request()).await;

        assert!(outcome.success);
        assert!(!outcome.metadata.fallback);
        assert!(outcome.error.is_none());
        let recorded: Vec<_> = outcome.metadata.stages.iter().map(|s| s.stage).collect();
        assert_eq!(recorded, StageName::all().to_vec());
        assert!(outcome
            .metadata
            .stages
            .iter()
            .all(|s| s.status == StageStatus::Completed));
        assert!(outcome.fitness > 0.0);
        assert!(outcome.validation.is_some());
        assert!((outcome.metadata.accuracy - outcome.fitness / 100.0).abs() < 1e-9);
        assert!(!outcome.recommendations.is_empty());
        assert!(outcome.recommendations.windows(2).all(|w| w[0].priority <= w[1].priority));
        assert_eq!(pipeline.history().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_roster_fails_in_preprocessing() {
        let pipeline = Pipeline::default();
        let mut req = request();
        req.staff.clear();

        let outcome = pipeline.run(&req).await;
        assert!(!outcome.success);
        assert!(outcome.metadata.fallback);
        assert_eq!(outcome.overall_confidence, FALLBACK_CONFIDENCE);
        // The run never reaches algorithm selection.
        assert_eq!(outcome.metadata.stages.len(), 1);
        assert_eq!(outcome.metadata.stages[0].stage, StageName::Preprocessing);
        assert_eq!(outcome.metadata.stages[0].status, StageStatus::Failed);
    }

    #[tokio::test]
    async fn test_unknown_solver_fails_in_selection() {
        let pipeline = Pipeline::default();
        let mut req = request();
        req.preset = Preset::Custom("simulated_annealing".into());

        let outcome = pipeline.run(&req).await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.metadata.stages.last().unwrap().stage,
            StageName::AlgorithmSelection
        );
    }

    #[tokio::test]
    async fn test_one_failing_solver_does_not_abort_the_batch() {
        let mut registry = SolverRegistry::new();
        registry.register(Arc::new(FailingSolver));
        registry.register(Arc::new(crate::solver::GreedySolver::new()));
        let pipeline = Pipeline::default().with_registry(registry);

        let mut req = request();
        req.preset = Preset::Custom("failing,greedy".into());

        let outcome = pipeline.run(&req).await;
        assert!(outcome.success);
        assert_eq!(outcome.solver_runs.len(), 2);
        let failed = outcome
            .solver_runs
            .iter()
            .find(|r| r.algorithm == "failing")
            .unwrap();
        assert!(!failed.success);
        assert!(failed.error.is_some());
        assert!(outcome.fitness > 0.0);
    }

    #[tokio::test]
    async fn test_all_solvers_failing_falls_back() {
        let mut registry = SolverRegistry::new();
        registry.register(Arc::new(FailingSolver));
        let pipeline = Pipeline::default().with_registry(registry);

        let mut req = request();
        req.preset = Preset::Custom("failing".into());

        let outcome = pipeline.run(&req).await;
        assert!(!outcome.success);
        assert!(outcome.metadata.fallback);
        assert_eq!(outcome.schedule.len(), 0);
        assert_eq!(
            outcome.metadata.stages.last().unwrap().stage,
            StageName::Optimization
        );
        assert!(outcome.error.as_deref().unwrap().contains("every solver"));
    }

    #[tokio::test]
    async fn test_second_run_hits_constraint_cache() {
        let pipeline = Pipeline::default();
        let req = request();

        let first = pipeline.run(&req).await;
        let second = pipeline.run(&req).await;
        assert!(!first.metadata.cache_hit);
        assert!(second.metadata.cache_hit);
    }
}
