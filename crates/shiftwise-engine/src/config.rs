//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the optimization pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How many solvers run at once within one request.
    pub max_concurrent_solvers: usize,

    /// Processed-constraint cache entry lifetime.
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,

    /// Processed-constraint cache capacity.
    pub cache_capacity: u64,

    /// Bounded run-history capacity.
    pub history_capacity: usize,

    /// Repair passes attempted on a weak winner before giving up.
    pub repair_attempts: usize,

    /// Fitness floor below which post-processing attempts repair.
    pub repair_threshold: f64,

    /// Per-solver wall-clock cap.
    #[serde(with = "duration_secs")]
    pub solver_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_solvers: 3,
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 256,
            history_capacity: 100,
            repair_attempts: 2,
            repair_threshold: 85.0,
            solver_timeout: Duration::from_secs(30),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
