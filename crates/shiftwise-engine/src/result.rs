//! Pipeline output types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shiftwise_core::{ConfidenceResult, Schedule, Severity, SolverRun, ValidationReport};

use crate::context::StageRecord;

/// How strongly the engine endorses the final schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    /// Confidence at or above 0.85: publish as-is.
    Approve,
    /// Confidence at or above 0.65: usable after a manual pass.
    Review,
    /// Anything lower: treat as a draft.
    Caution,
}

impl RecommendationTier {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.85 {
            RecommendationTier::Approve
        } else if confidence >= 0.65 {
            RecommendationTier::Review
        } else {
            RecommendationTier::Caution
        }
    }

    /// Confidence cutoffs apply only when no hard constraint is still
    /// violated; outstanding critical violations force Caution.
    pub fn classify(confidence: f64, critical_violations: usize) -> Self {
        if critical_violations > 0 {
            RecommendationTier::Caution
        } else {
            Self::from_confidence(confidence)
        }
    }
}

/// One entry in the prioritized recommendation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub tier: RecommendationTier,

    /// 1 is most urgent; the list is sorted by this field.
    pub priority: u8,

    pub message: String,
}

impl Recommendation {
    pub fn for_confidence(confidence: f64) -> Self {
        let tier = RecommendationTier::from_confidence(confidence);
        Self {
            tier,
            priority: 1,
            message: tier_message(tier).to_string(),
        }
    }

    /// Builds the prioritized list from the overall confidence and the
    /// violations still outstanding after repair.
    pub fn build(confidence: f64, validation: Option<&ValidationReport>) -> Vec<Recommendation> {
        let critical = validation
            .map(|v| v.violations_of(Severity::Critical).count())
            .unwrap_or(0);
        let high = validation
            .map(|v| v.violations_of(Severity::High).count())
            .unwrap_or(0);

        let tier = RecommendationTier::classify(confidence, critical);
        let mut out = vec![Recommendation {
            tier,
            priority: 1,
            message: tier_message(tier).to_string(),
        }];

        if critical > 0 {
            out.push(Recommendation {
                tier: RecommendationTier::Caution,
                priority: 1,
                message: format!(
                    "{} hard-constraint violation(s) remain unresolved; fix them before publishing",
                    critical
                ),
            });
        }
        if high > 0 {
            out.push(Recommendation {
                tier: RecommendationTier::Review,
                priority: 2,
                message: format!("{} high-severity issue(s) are worth a manual look", high),
            });
        }
        if confidence < 0.65 {
            out.push(Recommendation {
                tier: RecommendationTier::Caution,
                priority: 2,
                message: "rerun with the best preset or loosen the constraints".to_string(),
            });
        }

        out.sort_by_key(|r| r.priority);
        out
    }
}

fn tier_message(tier: RecommendationTier) -> &'static str {
    match tier {
        RecommendationTier::Approve => "High confidence: the schedule can be published as-is",
        RecommendationTier::Review => {
            "Moderate confidence: review flagged dates before publishing"
        }
        RecommendationTier::Caution => {
            "Low confidence: treat this schedule as a draft and revisit the constraints"
        }
    }
}

/// A runner-up schedule worth showing alongside the winner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    /// Where the candidate came from (a solver name, or `ensemble`).
    pub source: String,

    pub schedule: Schedule,

    pub fitness: f64,

    /// Shift-level similarity to the winning schedule.
    pub similarity_to_best: f64,

    /// Estimated confidence for this candidate on its own.
    pub confidence: f64,

    /// One-line comparison against the winner.
    pub tradeoff: String,
}

/// Timing and provenance metadata for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub stages: Vec<StageRecord>,

    /// Preset the run was requested with.
    pub preset: String,

    /// Solver names that ran, in batch order.
    pub algorithms: Vec<String>,

    /// Realized accuracy of the run, `fitness / 100` clamped to `[0, 1]`.
    pub accuracy: f64,

    /// Violations outstanding in the final schedule.
    pub violation_count: usize,

    /// Whether processed constraints came from the cache.
    pub cache_hit: bool,

    /// Whether the run fell back to the existing schedule.
    pub fallback: bool,
}

/// Everything a completed pipeline run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Whether a fresh schedule was generated and validated.
    pub success: bool,

    /// The final schedule (a fallback copy of the existing schedule when
    /// `success` is false).
    pub schedule: Schedule,

    /// Winner fitness in `[0, 100]`; 0.0 on fallback.
    pub fitness: f64,

    /// Validation of the final schedule, if the run got that far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,

    /// Confidence assessment, if the run got that far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ConfidenceResult>,

    /// Overall confidence in `[0, 1]` (a reduced constant on fallback).
    pub overall_confidence: f64,

    /// The triggering error when the run fell back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Prioritized recommendations, most urgent first.
    pub recommendations: Vec<Recommendation>,

    /// Up to three runner-up schedules.
    pub alternatives: Vec<Alternative>,

    /// Every solver run from the batch, failures included.
    pub solver_runs: Vec<SolverRun>,

    pub metadata: RunMetadata,
}
