//! Shift kinds and the continuous-to-discrete bridge.
//!
//! Solvers search over continuous values in `[0, 1]`; constraint evaluators
//! and the final schedule work in terms of four discrete shift kinds. The
//! fixed thresholds here are the single point of truth for that mapping and
//! are boundary-inclusive on the lower side: downstream evaluators assume
//! these exact cut points.

use serde::{Deserialize, Serialize};

/// One of the four discrete shift kinds a slot can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    /// Day off.
    Off,
    /// Early shift.
    Early,
    /// Late shift.
    Late,
    /// Normal working shift.
    Normal,
}

impl ShiftKind {
    /// Discretize a continuous slot value into a shift kind.
    ///
    /// `v <= 0.25` → Off, `v <= 0.5` → Early, `v <= 0.75` → Late,
    /// otherwise Normal. Values outside `[0, 1]` are clamped first.
    pub fn from_value(v: f64) -> Self {
        let v = v.clamp(0.0, 1.0);
        if v <= 0.25 {
            ShiftKind::Off
        } else if v <= 0.5 {
            ShiftKind::Early
        } else if v <= 0.75 {
            ShiftKind::Late
        } else {
            ShiftKind::Normal
        }
    }

    /// Re-encode a shift kind as the midpoint of its interval.
    ///
    /// Midpoints guarantee `from_value(kind.to_value()) == kind`, so a
    /// schedule converted to a solution and back is unchanged.
    pub fn to_value(self) -> f64 {
        match self {
            ShiftKind::Off => 0.125,
            ShiftKind::Early => 0.375,
            ShiftKind::Late => 0.625,
            ShiftKind::Normal => 0.875,
        }
    }

    /// Whether this kind counts as working (anything but a day off).
    pub fn is_working(self) -> bool {
        !matches!(self, ShiftKind::Off)
    }

    /// Whether this kind is Off or Early, the states that matter for
    /// staff-group conflict evaluation.
    pub fn is_off_or_early(self) -> bool {
        matches!(self, ShiftKind::Off | ShiftKind::Early)
    }

    /// All four kinds in canonical order.
    pub fn all() -> [ShiftKind; 4] {
        [
            ShiftKind::Off,
            ShiftKind::Early,
            ShiftKind::Late,
            ShiftKind::Normal,
        ]
    }
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ShiftKind::Off => "off",
            ShiftKind::Early => "early",
            ShiftKind::Late => "late",
            ShiftKind::Normal => "normal",
        };
        write!(f, "{}", s)
    }
}
