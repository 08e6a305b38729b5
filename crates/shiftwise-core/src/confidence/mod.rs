//! Multi-factor confidence scoring for generated schedules.

mod factors;
mod scorer;

pub use factors::{ConfidenceLevel, FactorScore, FactorStatus, TrustFlags};
pub use scorer::{score, ConfidenceResult, ScoringInput};
