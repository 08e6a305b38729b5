//! Scheduling request parsing from YAML/JSON.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::schedule::Schedule;
use super::staff::Staff;
use crate::constraints::RawConstraints;

/// Errors that can occur when parsing or validating requests.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Failed to read request file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Request validation failed: {0}")]
    ValidationError(String),
}

/// Named solver preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Fastest: a single constructive solver.
    Quick,
    /// Construction plus a bounded local search.
    #[default]
    Balanced,
    /// Everything registered, with generous search budgets.
    Best,
    /// Comma-separated list of registered solver names.
    #[serde(untagged)]
    Custom(String),
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preset::Quick => write!(f, "quick"),
            Preset::Balanced => write!(f, "balanced"),
            Preset::Best => write!(f, "best"),
            Preset::Custom(s) => write!(f, "{}", s),
        }
    }
}

/// Free-form per-request options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Override of the engine's maximum concurrent solvers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_solvers: Option<usize>,
}

/// A complete scheduling request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// Staff roster.
    pub staff: Vec<Staff>,

    /// Ordered calendar dates to schedule.
    pub dates: Vec<NaiveDate>,

    /// The seven raw rule families.
    #[serde(default)]
    pub constraints: RawConstraints,

    /// Existing schedule used as the search seed and the fallback.
    #[serde(default)]
    pub existing_schedule: Schedule,

    /// Solver preset.
    #[serde(default)]
    pub preset: Preset,

    /// Per-request options.
    #[serde(default)]
    pub options: RequestOptions,
}

impl ScheduleRequest {
    /// Parses a request from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RequestError> {
        let request: ScheduleRequest = serde_yaml::from_str(yaml)?;
        request.validate()?;
        Ok(request)
    }

    /// Parses a request from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        let request: ScheduleRequest = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    /// Parses a request from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RequestError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parses a request from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RequestError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Validates the request shape.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.staff.is_empty() {
            return Err(RequestError::ValidationError(
                "staff roster is empty".to_string(),
            ));
        }
        if self.dates.is_empty() {
            return Err(RequestError::ValidationError(
                "date range is empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for member in &self.staff {
            if member.id.is_empty() {
                return Err(RequestError::ValidationError(
                    "staff member with empty id".to_string(),
                ));
            }
            if !seen.insert(&member.id) {
                return Err(RequestError::ValidationError(format!(
                    "duplicate staff id: {}",
                    member.id
                )));
            }
        }

        if self.dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(RequestError::ValidationError(
                "dates must be strictly increasing".to_string(),
            ));
        }

        Ok(())
    }

    /// Roster ids in request order.
    pub fn staff_ids(&self) -> Vec<String> {
        self.staff.iter().map(|s| s.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_REQUEST: &str = r#"
staff:
  - id: "s1"
    name: "Alice"
  - id: "s2"
    name: "Bob"
dates:
  - 2026-03-02
  - 2026-03-03
  - 2026-03-04
constraints:
  daily_limits:
    - shift_kind: off
      max_count: 1
      hard: true
preset: quick
"#;

    #[test]
    fn test_parse_valid_request() {
        let request = ScheduleRequest::from_yaml(VALID_REQUEST).unwrap();
        assert_eq!(request.staff.len(), 2);
        assert_eq!(request.dates.len(), 3);
        assert_eq!(request.constraints.daily_limits.len(), 1);
        assert_eq!(request.preset, Preset::Quick);
    }

    #[test]
    fn test_empty_staff_rejected() {
        let yaml = r#"
staff: []
dates:
  - 2026-03-02
"#;
        let result = ScheduleRequest::from_yaml(yaml);
        assert!(matches!(result, Err(RequestError::ValidationError(_))));
    }

    #[test]
    fn test_empty_dates_rejected() {
        let yaml = r#"
staff:
  - id: "s1"
    name: "Alice"
dates: []
"#;
        let result = ScheduleRequest::from_yaml(yaml);
        assert!(matches!(result, Err(RequestError::ValidationError(_))));
    }

    #[test]
    fn test_duplicate_staff_ids_rejected() {
        let yaml = r#"
staff:
  - id: "s1"
    name: "Alice"
  - id: "s1"
    name: "Bob"
dates:
  - 2026-03-02
"#;
        let result = ScheduleRequest::from_yaml(yaml);
        assert!(matches!(result, Err(RequestError::ValidationError(_))));
    }

    #[test]
    fn test_unordered_dates_rejected() {
        let yaml = r#"
staff:
  - id: "s1"
    name: "Alice"
dates:
  - 2026-03-04
  - 2026-03-02
"#;
        let result = ScheduleRequest::from_yaml(yaml);
        assert!(matches!(result, Err(RequestError::ValidationError(_))));
    }

    #[test]
    fn test_custom_preset_parses() {
        let json = serde_json::json!({
            "staff": [{"id": "s1", "name": "Alice"}],
            "dates": ["2026-03-02"],
            "preset": "greedy,local_search"
        });
        let request = ScheduleRequest::from_json(&json.to_string()).unwrap();
        assert_eq!(
            request.preset,
            Preset::Custom("greedy,local_search".to_string())
        );
    }
}
