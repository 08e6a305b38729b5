//! Factor and level types for the confidence scorer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Qualitative status of one confidence factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl FactorStatus {
    /// Classifies a factor value: ≥0.9 excellent, ≥0.8 good, ≥0.6 fair,
    /// ≥0.4 poor, below that very poor.
    pub fn from_value(value: f64) -> Self {
        if value >= 0.9 {
            FactorStatus::Excellent
        } else if value >= 0.8 {
            FactorStatus::Good
        } else if value >= 0.6 {
            FactorStatus::Fair
        } else if value >= 0.4 {
            FactorStatus::Poor
        } else {
            FactorStatus::VeryPoor
        }
    }
}

/// One scored confidence factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorScore {
    /// Factor name, e.g. `constraint_satisfaction`.
    pub name: String,

    /// Factor value in `[0, 1]`.
    pub value: f64,

    /// Weight in the overall score.
    pub weight: f64,

    /// Qualitative classification of `value`.
    pub status: FactorStatus,
}

impl FactorScore {
    pub fn new(name: impl Into<String>, value: f64, weight: f64) -> Self {
        let value = value.clamp(0.0, 1.0);
        Self {
            name: name.into(),
            value,
            weight,
            status: FactorStatus::from_value(value),
        }
    }
}

/// Overall confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceLevel {
    /// Classifies an overall score: ≥0.90 very high, ≥0.80 high,
    /// ≥0.65 medium, ≥0.50 low, below that very low.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.90 {
            ConfidenceLevel::VeryHigh
        } else if score >= 0.80 {
            ConfidenceLevel::High
        } else if score >= 0.65 {
            ConfidenceLevel::Medium
        } else if score >= 0.50 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    /// Fixed human-readable label for the level.
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "Very High Confidence",
            ConfidenceLevel::High => "High Confidence",
            ConfidenceLevel::Medium => "Medium Confidence",
            ConfidenceLevel::Low => "Low Confidence",
            ConfidenceLevel::VeryLow => "Very Low Confidence",
        }
    }

    /// Fixed guidance attached to the level.
    pub fn recommendation(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "The schedule can be applied as generated",
            ConfidenceLevel::High => "The schedule is solid; skim the flagged dates",
            ConfidenceLevel::Medium => "Review the schedule before applying it",
            ConfidenceLevel::Low => "Revise the schedule manually before use",
            ConfidenceLevel::VeryLow => "Regenerate with adjusted constraints",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceLevel::VeryHigh => "very_high",
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::VeryLow => "very_low",
        };
        f.write_str(s)
    }
}

/// Trust indicators derived from the individual factors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrustFlags {
    /// Constraint satisfaction at or above 0.8.
    pub reliable: bool,

    /// Coverage completeness at or above 0.7.
    pub feasible: bool,

    /// Solution stability at or above 0.7.
    pub stable: bool,

    /// Historical accuracy at or above 0.6.
    pub experienced: bool,
}

impl TrustFlags {
    /// Whether at least three of the four indicators hold.
    pub fn trusted(&self) -> bool {
        [self.reliable, self.feasible, self.stable, self.experienced]
            .iter()
            .filter(|f| **f)
            .count()
            >= 3
    }
}
