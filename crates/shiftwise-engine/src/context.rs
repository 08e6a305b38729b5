//! Per-run execution context and stage tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The six pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Preprocessing,
    AlgorithmSelection,
    Optimization,
    Validation,
    Postprocessing,
    Finalization,
}

impl StageName {
    /// All stages in execution order.
    pub fn all() -> [StageName; 6] {
        [
            StageName::Preprocessing,
            StageName::AlgorithmSelection,
            StageName::Optimization,
            StageName::Validation,
            StageName::Postprocessing,
            StageName::Finalization,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Preprocessing => "preprocessing",
            StageName::AlgorithmSelection => "algorithm_selection",
            StageName::Optimization => "optimization",
            StageName::Validation => "validation",
            StageName::Postprocessing => "postprocessing",
            StageName::Finalization => "finalization",
        }
    }
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Failed,
    Skipped,
}

/// Timing and outcome of one executed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: StageName,
    pub status: StageStatus,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Mutable state threaded through one pipeline run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique run identifier.
    pub run_id: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// Records for stages executed so far, in order.
    pub stages: Vec<StageRecord>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        let started_at = Utc::now();
        let suffix: u32 = rand::random_range(0..1_000_000);
        Self {
            run_id: format!("run-{}-{:06}", started_at.format("%Y%m%d%H%M%S"), suffix),
            started_at,
            stages: Vec::new(),
        }
    }

    /// Records a completed stage.
    pub fn record(&mut self, stage: StageName, elapsed_ms: u64) {
        self.stages.push(StageRecord {
            stage,
            status: StageStatus::Completed,
            elapsed_ms,
            error: None,
        });
    }

    /// Records a failed stage.
    pub fn record_failure(&mut self, stage: StageName, elapsed_ms: u64, error: impl Into<String>) {
        self.stages.push(StageRecord {
            stage,
            status: StageStatus::Failed,
            elapsed_ms,
            error: Some(error.into()),
        });
    }

    /// The deepest stage reached so far, if any ran.
    pub fn reached_stage(&self) -> Option<StageName> {
        self.stages.last().map(|r| r.stage)
    }

    /// Total elapsed time across recorded stages.
    pub fn elapsed_ms(&self) -> u64 {
        self.stages.iter().map(|r| r.elapsed_ms).sum()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
