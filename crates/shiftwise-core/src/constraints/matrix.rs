//! Matrix-style intermediate form of the processed constraints.
//!
//! Some algorithms want a coefficient view rather than callable
//! evaluators: one row per constraint record, one column per (staff, date)
//! slot, a nonzero coefficient where the constraint involves the slot.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::RawConstraints;
use crate::types::ProblemContext;

/// One constraint's slot involvement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixRow {
    /// Constraint-type name.
    pub constraint: String,

    /// Whether the row comes from a hard constraint.
    pub hard: bool,

    /// Coefficient per slot, row-major by staff.
    pub coefficients: Vec<f64>,
}

/// Coefficient structure over all constraints and slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintMatrix {
    /// Rows, in processing order.
    pub rows: Vec<MatrixRow>,

    /// Number of slot columns.
    pub slot_count: usize,
}

impl ConstraintMatrix {
    /// Builds the coefficient view of the raw constraints.
    pub fn build(raw: &RawConstraints, ctx: &ProblemContext) -> Self {
        let slot_count = ctx.slot_count();
        let date_count = ctx.dates.len();
        let mut rows = Vec::new();

        let mut row = |constraint: &str, hard: bool, slots: Vec<usize>| {
            let mut coefficients = vec![0.0; slot_count];
            for slot in slots {
                coefficients[slot] = 1.0;
            }
            rows.push(MatrixRow {
                constraint: constraint.to_string(),
                hard,
                coefficients,
            });
        };

        for group in &raw.staff_groups {
            let slots: Vec<usize> = group
                .members
                .iter()
                .filter_map(|id| ctx.staff_index(id))
                .flat_map(|s| (0..date_count).map(move |d| s * date_count + d))
                .collect();
            row("group_conflict", true, slots);
        }

        for limit in &raw.daily_limits {
            let slots: Vec<usize> = ctx
                .dates
                .iter()
                .enumerate()
                .filter(|(_, date)| {
                    limit.weekdays.is_empty() || limit.weekdays.contains(&date.weekday())
                })
                .flat_map(|(d, _)| (0..ctx.staff_ids.len()).map(move |s| s * date_count + d))
                .collect();
            row("daily_limit", limit.hard, slots);
        }

        for limit in &raw.monthly_limits {
            let staff: Vec<usize> = match &limit.staff_id {
                Some(id) => ctx.staff_index(id).into_iter().collect(),
                None => (0..ctx.staff_ids.len()).collect(),
            };
            let slots: Vec<usize> = staff
                .into_iter()
                .flat_map(|s| (0..date_count).map(move |d| s * date_count + d))
                .collect();
            row("monthly_limit", limit.max_count.is_some(), slots);
        }

        for rule in &raw.priority_rules {
            let slots: Vec<usize> = ctx
                .staff_index(&rule.staff_id)
                .into_iter()
                .flat_map(|s| {
                    ctx.dates
                        .iter()
                        .enumerate()
                        .filter(|(_, date)| rule.applies_on(**date))
                        .map(move |(d, _)| s * date_count + d)
                        .collect::<Vec<_>>()
                })
                .collect();
            row("priority_rule", rule.hard, slots);
        }

        for rule in &raw.calendar_rules {
            let Some(d) = ctx.date_index(rule.date) else {
                continue;
            };
            let staff: Vec<usize> = if rule.staff_ids.is_empty() {
                (0..ctx.staff_ids.len()).collect()
            } else {
                rule.staff_ids
                    .iter()
                    .filter_map(|id| ctx.staff_index(id))
                    .collect()
            };
            row(
                "calendar_rule",
                true,
                staff.into_iter().map(|s| s * date_count + d).collect(),
            );
        }

        if !raw.early_shift_permissions.is_empty() {
            row("early_shift_permission", true, (0..slot_count).collect());
        }

        Self { rows, slot_count }
    }

    /// Number of rows touching a given slot.
    pub fn involvement(&self, slot: usize) -> usize {
        self.rows
            .iter()
            .filter(|r| r.coefficients.get(slot).copied().unwrap_or(0.0) != 0.0)
            .count()
    }
}
