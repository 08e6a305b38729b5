//! # shiftwise-core
//!
//! Deterministic core of the Shiftwise scheduling engine: the domain model,
//! constraint integration, objective compilation, validation, and
//! confidence scoring.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same constraints and context always compile to the
//!    same objective, and the same solution always scores the same.
//! 2. **Total**: Processors skip malformed records with a warning instead of
//!    failing the batch; an infeasible solution is a scored outcome, not an
//!    error.
//! 3. **Bounded**: Every score lands in `[0, 100]` and every confidence
//!    factor in `[0, 1]`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use shiftwise_core::{
//!     confidence, validation, IntegrationLayer, ProblemContext, ScheduleRequest,
//! };
//!
//! let request = ScheduleRequest::from_yaml_file("schedule.yaml")?;
//! request.validate()?;
//!
//! let ctx = ProblemContext::analyze(
//!     request.staff_ids(),
//!     request.dates.clone(),
//!     &request.constraints,
//! );
//! let processed = IntegrationLayer::new().process(&request.constraints, &ctx);
//! let objective = processed.objective.clone();
//! // hand `objective` to a solver, then validate and score the winner
//! ```

pub mod confidence;
pub mod constraints;
pub mod model;
pub mod types;
pub mod validation;

pub use confidence::{ConfidenceLevel, ConfidenceResult, FactorScore, FactorStatus, TrustFlags};
pub use constraints::{
    fingerprint, BackupAssignment, CalendarDemand, CalendarRule, ConstraintEval, ConstraintMatrix,
    ConstraintProcessor, CoverageRule, DailyLimit, EarlyShiftPermission, IntegrationLayer,
    MonthlyLimit, ObjectiveBreakdown, ObjectiveFn, PriorityRule, ProcessError,
    ProcessedConstraints, ProximityRule, RawConstraints, Severity, StaffGroup, Violation,
};
pub use model::{
    Assignment, Preset, RequestError, RequestOptions, Schedule, ScheduleRequest, ShiftKind,
    Solution, Staff, StaffStatus,
};
pub use types::{
    ConvergenceReason, ProblemContext, RunRecord, SizeCategory, SolverRun,
};
pub use validation::{validate_raw, validate_solution, ValidationReport};
