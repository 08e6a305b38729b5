//! Schedules and their continuous search-space encoding.
//!
//! A `Schedule` is the discrete, human-facing artifact: one shift kind per
//! (staff, date) slot. A `Solution` is the flat continuous encoding solvers
//! search over. The two convert losslessly through the `ShiftKind`
//! thresholds.
//!
//! `Schedule` is backed by a `BTreeMap` so iteration order is deterministic:
//! same input always produces same output, including serialized form.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::shift::ShiftKind;
use crate::types::ProblemContext;

/// A discrete shift assignment: (staff, date) → shift kind.
///
/// Serializes as a flat assignment list; tuple map keys have no JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Assignment>", into = "Vec<Assignment>")]
pub struct Schedule {
    assignments: BTreeMap<(String, NaiveDate), ShiftKind>,
}

/// One serialized schedule entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub staff_id: String,
    pub date: NaiveDate,
    pub shift: ShiftKind,
}

impl From<Vec<Assignment>> for Schedule {
    fn from(entries: Vec<Assignment>) -> Self {
        let mut schedule = Schedule::new();
        for entry in entries {
            schedule.assign(entry.staff_id, entry.date, entry.shift);
        }
        schedule
    }
}

impl From<Schedule> for Vec<Assignment> {
    fn from(schedule: Schedule) -> Self {
        schedule
            .assignments
            .into_iter()
            .map(|((staff_id, date), shift)| Assignment {
                staff_id,
                date,
                shift,
            })
            .collect()
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a shift kind to a slot, replacing any prior assignment.
    pub fn assign(&mut self, staff_id: impl Into<String>, date: NaiveDate, kind: ShiftKind) {
        self.assignments.insert((staff_id.into(), date), kind);
    }

    /// The assignment for a slot, if one exists.
    pub fn get(&self, staff_id: &str, date: NaiveDate) -> Option<ShiftKind> {
        self.assignments.get(&(staff_id.to_string(), date)).copied()
    }

    /// Number of assigned slots.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the schedule has no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Iterates assignments in deterministic (staff, date) order.
    pub fn iter(&self) -> impl Iterator<Item = (&(String, NaiveDate), &ShiftKind)> {
        self.assignments.iter()
    }

    /// Counts slots assigned a given kind.
    pub fn count_kind(&self, kind: ShiftKind) -> usize {
        self.assignments.values().filter(|k| **k == kind).count()
    }

    /// Encodes this schedule as a continuous solution over the problem's
    /// slot grid. Unassigned slots default to Normal's midpoint.
    pub fn to_solution(&self, ctx: &ProblemContext) -> Solution {
        let mut solution = Solution::filled(ctx, ShiftKind::Normal.to_value());
        for (s, staff_id) in ctx.staff_ids.iter().enumerate() {
            for (d, date) in ctx.dates.iter().enumerate() {
                if let Some(kind) = self.get(staff_id, *date) {
                    solution.set(s, d, kind.to_value());
                }
            }
        }
        solution
    }
}

/// A candidate in continuous search space: one value in `[0, 1]` per
/// (staff, date) slot, row-major by staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    values: Vec<f64>,
    staff_count: usize,
    date_count: usize,
}

impl Solution {
    /// Creates a solution with every slot set to `value`.
    pub fn filled(ctx: &ProblemContext, value: f64) -> Self {
        Self {
            values: vec![value; ctx.staff_ids.len() * ctx.dates.len()],
            staff_count: ctx.staff_ids.len(),
            date_count: ctx.dates.len(),
        }
    }

    /// Wraps raw slot values. Panics in debug builds if the length does not
    /// match `staff_count * date_count`.
    pub fn from_values(values: Vec<f64>, staff_count: usize, date_count: usize) -> Self {
        debug_assert_eq!(values.len(), staff_count * date_count);
        Self {
            values,
            staff_count,
            date_count,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the solution has no slots.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of staff rows.
    pub fn staff_count(&self) -> usize {
        self.staff_count
    }

    /// Number of date columns.
    pub fn date_count(&self) -> usize {
        self.date_count
    }

    /// The raw value at a slot.
    pub fn get(&self, staff_idx: usize, date_idx: usize) -> f64 {
        self.values[staff_idx * self.date_count + date_idx]
    }

    /// Sets the raw value at a slot.
    pub fn set(&mut self, staff_idx: usize, date_idx: usize, value: f64) {
        self.values[staff_idx * self.date_count + date_idx] = value;
    }

    /// The discretized shift kind at a slot.
    pub fn kind_at(&self, staff_idx: usize, date_idx: usize) -> ShiftKind {
        ShiftKind::from_value(self.get(staff_idx, date_idx))
    }

    /// Raw slot values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Fraction of slots whose discretized kind matches `other`.
    ///
    /// Returns 1.0 for two empty solutions, 0.0 on dimension mismatch.
    pub fn similarity(&self, other: &Solution) -> f64 {
        if self.staff_count != other.staff_count || self.date_count != other.date_count {
            return 0.0;
        }
        if self.values.is_empty() {
            return 1.0;
        }
        let matching = self
            .values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| ShiftKind::from_value(**a) == ShiftKind::from_value(**b))
            .count();
        matching as f64 / self.values.len() as f64
    }

    /// Discretizes every slot into a schedule.
    pub fn to_schedule(&self, ctx: &ProblemContext) -> Schedule {
        let mut schedule = Schedule::new();
        for (s, staff_id) in ctx.staff_ids.iter().enumerate() {
            for (d, date) in ctx.dates.iter().enumerate() {
                schedule.assign(staff_id.clone(), *date, self.kind_at(s, d));
            }
        }
        schedule
    }
}
