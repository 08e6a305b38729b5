//! # shiftwise-engine
//!
//! Async optimization pipeline for Shiftwise. Turns a
//! [`shiftwise_core::ScheduleRequest`] into a validated, confidence-scored
//! schedule through six fixed stages:
//!
//! 1. **Preprocessing**: request validation, problem analysis, and cached
//!    compilation of the raw rules
//! 2. **Algorithm selection**: preset-driven solver choice
//! 3. **Optimization**: bounded-concurrency solver fan-out
//! 4. **Validation**: hard-constraint checking and confidence scoring
//! 5. **Postprocessing**: bounded repair, alternatives, recommendations
//! 6. **Finalization**: result assembly and history recording
//!
//! A failed stage never surfaces as an error: the pipeline falls back to
//! the caller's existing schedule with sharply reduced confidence.
//!
//! ## Example
//!
//! ```rust,ignore
//! use shiftwise_core::ScheduleRequest;
//! use shiftwise_engine::{EngineConfig, Pipeline};
//!
//! let pipeline = Pipeline::new(EngineConfig::default());
//! let request = ScheduleRequest::from_yaml_file("schedule.yaml")?;
//! let outcome = pipeline.run(&request).await;
//! println!("{} ({:.0}%)", outcome.recommendations[0].message, outcome.fitness);
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod history;
pub mod pipeline;
pub mod postprocess;
pub mod result;
pub mod selection;
pub mod solver;

pub use cache::ConstraintCache;
pub use config::EngineConfig;
pub use context::{ExecutionContext, StageName, StageRecord, StageStatus};
pub use history::ExecutionHistory;
pub use pipeline::{Pipeline, PipelineError};
pub use result::{
    Alternative, PipelineOutcome, Recommendation, RecommendationTier, RunMetadata,
};
pub use selection::{SelectedSolver, SelectionError, SolverRegistry};
pub use solver::{
    GreedySolver, LocalSearchSolver, SolveRequest, Solver, SolverError, SolverParams,
    SolverSolution,
};
