//! Staff roster types.

use serde::{Deserialize, Serialize};

/// Employment status of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    /// Available for scheduling.
    #[default]
    Active,
    /// Temporarily unavailable (leave, secondment).
    Inactive,
}

/// A member of the staff roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    /// Unique staff identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Employment status.
    #[serde(default)]
    pub status: StaffStatus,
}

impl Staff {
    /// Creates an active staff member.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: StaffStatus::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_staff_is_active() {
        let s = Staff::new("s1", "Alice");
        assert_eq!(s.status, StaffStatus::Active);
    }
}
