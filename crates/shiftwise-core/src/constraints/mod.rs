//! Raw business rules and their evaluable representation.
//!
//! Seven rule families arrive from the caller as plain records
//! ([`RawConstraints`]). Each family has a processor
//! ([`processor::ConstraintProcessor`]) that turns its records into typed
//! constraint objects; the integration layer merges those into a single
//! [`ProcessedConstraints`] value with a compiled objective function.

pub mod integration;
pub mod matrix;
pub mod objective;
pub mod processor;
pub mod processors;

pub use integration::{fingerprint, IntegrationLayer, ProcessedConstraints};
pub use matrix::ConstraintMatrix;
pub use objective::{ObjectiveBreakdown, ObjectiveFn};
pub use processor::{
    ConstraintEval, ConstraintProcessor, OptimizationTarget, PenaltyFn, ProcessError,
    ProcessorOutput, SoftConstraint,
};

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::model::ShiftKind;

/// Severity of a constraint violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A hard rule is broken; the solution is invalid.
    Critical,
    /// A strongly weighted preference is broken.
    High,
    /// A mildly weighted preference is broken.
    Medium,
}

/// One observed violation of a constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the violated constraint (e.g. `"group_conflict"`).
    pub constraint: String,

    /// Severity class.
    pub severity: Severity,

    /// Date the violation occurred on, when date-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Staff member involved, when staff-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,

    /// Violation magnitude; feeds the objective function.
    pub magnitude: f64,

    /// Number of conflicting members for group conflicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_count: Option<usize>,

    /// Human-readable description.
    pub detail: String,
}

/// Coverage rule attached to a staff group: when group members are off, a
/// designated backup must be working the given shift kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRule {
    /// Staff member who must cover.
    pub backup_staff: String,

    /// Shift kind the backup must work.
    pub shift_kind: ShiftKind,
}

/// Proximity rule attached to a staff group: two members' days off must
/// fall within `max_distance_days` of each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityRule {
    /// First staff member.
    pub staff_a: String,

    /// Second staff member.
    pub staff_b: String,

    /// Maximum allowed distance between their days off, in days.
    pub max_distance_days: u32,
}

/// A set of staff who must not simultaneously be off or on early shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffGroup {
    /// Group identifier.
    pub id: String,

    /// Member staff ids.
    pub members: Vec<String>,

    /// Optional coverage rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageRule>,

    /// Optional proximity rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity: Option<ProximityRule>,
}

/// Maximum count of a shift kind per day, optionally restricted to
/// specific weekdays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLimit {
    /// Shift kind being limited.
    pub shift_kind: ShiftKind,

    /// Maximum occurrences per day.
    pub max_count: u32,

    /// Weekdays the limit applies to; empty means every day.
    #[serde(default)]
    pub weekdays: Vec<Weekday>,

    /// Hard limit (invalidates) or soft preference.
    #[serde(default)]
    pub hard: bool,
}

/// Per-staff monthly bounds on a shift kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyLimit {
    /// Staff member the limit applies to; `None` applies to everyone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,

    /// Shift kind being counted.
    pub shift_kind: ShiftKind,

    /// Maximum occurrences per calendar month. Hard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,

    /// Minimum occurrences per calendar month. Soft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,
}

/// A (staff, weekday-set, date-range) condition mapping to a preferred or
/// required shift kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRule {
    /// Staff member the rule applies to.
    pub staff_id: String,

    /// Weekdays the rule applies to; empty means every day.
    #[serde(default)]
    pub weekdays: Vec<Weekday>,

    /// Effective start date, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,

    /// Effective end date, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,

    /// The shift kind preferred or required.
    pub shift_kind: ShiftKind,

    /// Priority level; higher levels carry more weight.
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Required (hard) or preferred (soft).
    #[serde(default)]
    pub hard: bool,
}

fn default_priority() -> u8 {
    1
}

impl PriorityRule {
    /// Whether the rule is in effect on `date`.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date > to {
                return false;
            }
        }
        self.weekdays.is_empty() || self.weekdays.contains(&date.weekday())
    }
}

/// Ordered backup staff for a staff group, consulted when primary members
/// are unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupAssignment {
    /// Staff group the backups belong to.
    pub group_id: String,

    /// Backup staff ids, in consultation order.
    pub backups: Vec<String>,
}

/// Per-staff permission to take the early shift.
///
/// An entry with a date applies to that exact date; an entry without a date
/// is the staff member's default. With neither, early shift is not
/// permitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyShiftPermission {
    /// Staff member.
    pub staff_id: String,

    /// Exact date, or `None` for the per-staff default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Whether early shift is permitted.
    pub permitted: bool,
}

/// What a calendar rule demands of the affected staff on its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarDemand {
    /// A non-Off shift kind is required.
    MustWork,
    /// The Off kind is required.
    MustDayOff,
}

/// A per-date override for all or specific staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRule {
    /// Date the rule applies to.
    pub date: NaiveDate,

    /// Affected staff ids; empty means everyone.
    #[serde(default)]
    pub staff_ids: Vec<String>,

    /// Whether staff must work or must be off.
    pub demand: CalendarDemand,
}

/// The seven raw rule families as supplied by the caller. Immutable for
/// the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConstraints {
    #[serde(default)]
    pub staff_groups: Vec<StaffGroup>,

    #[serde(default)]
    pub daily_limits: Vec<DailyLimit>,

    #[serde(default)]
    pub monthly_limits: Vec<MonthlyLimit>,

    #[serde(default)]
    pub priority_rules: Vec<PriorityRule>,

    #[serde(default)]
    pub backup_assignments: Vec<BackupAssignment>,

    #[serde(default)]
    pub early_shift_permissions: Vec<EarlyShiftPermission>,

    #[serde(default)]
    pub calendar_rules: Vec<CalendarRule>,
}

impl RawConstraints {
    /// Total number of raw rule records across all families.
    pub fn record_count(&self) -> usize {
        self.staff_groups.len()
            + self.daily_limits.len()
            + self.monthly_limits.len()
            + self.priority_rules.len()
            + self.backup_assignments.len()
            + self.early_shift_permissions.len()
            + self.calendar_rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_rule_date_window() {
        let rule = PriorityRule {
            staff_id: "a".into(),
            weekdays: vec![],
            from: NaiveDate::from_ymd_opt(2026, 3, 10),
            to: NaiveDate::from_ymd_opt(2026, 3, 20),
            shift_kind: ShiftKind::Early,
            priority: 1,
            hard: false,
        };
        assert!(!rule.applies_on(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()));
        assert!(rule.applies_on(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()));
        assert!(rule.applies_on(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap()));
        assert!(!rule.applies_on(NaiveDate::from_ymd_opt(2026, 3, 21).unwrap()));
    }

    #[test]
    fn test_priority_rule_weekday_filter() {
        let rule = PriorityRule {
            staff_id: "a".into(),
            weekdays: vec![Weekday::Mon, Weekday::Tue],
            from: None,
            to: None,
            shift_kind: ShiftKind::Normal,
            priority: 1,
            hard: false,
        };
        // 2026-03-02 is a Monday.
        assert!(rule.applies_on(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()));
        assert!(!rule.applies_on(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()));
    }

    #[test]
    fn test_record_count() {
        let mut raw = RawConstraints::default();
        assert_eq!(raw.record_count(), 0);
        raw.daily_limits.push(DailyLimit {
            shift_kind: ShiftKind::Off,
            max_count: 2,
            weekdays: vec![],
            hard: true,
        });
        raw.staff_groups.push(StaffGroup {
            id: "g1".into(),
            members: vec!["a".into(), "b".into()],
            coverage: None,
            proximity: None,
        });
        assert_eq!(raw.record_count(), 2);
    }
}
