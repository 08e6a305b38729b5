//! Domain model: shift kinds, staff, schedules, and scheduling requests.

mod request;
mod schedule;
mod shift;
mod staff;

pub use request::{Preset, RequestError, RequestOptions, ScheduleRequest};
pub use schedule::{Assignment, Schedule, Solution};
pub use shift::ShiftKind;
pub use staff::{Staff, StaffStatus};
