//! One processor per rule family.

mod backup;
mod calendar;
mod daily_limit;
mod early_shift;
mod monthly_limit;
mod priority_rule;
mod staff_group;

pub use backup::BackupProcessor;
pub use calendar::CalendarProcessor;
pub use daily_limit::DailyLimitProcessor;
pub use early_shift::EarlyShiftProcessor;
pub use monthly_limit::MonthlyLimitProcessor;
pub use priority_rule::PriorityRuleProcessor;
pub use staff_group::StaffGroupProcessor;

use super::processor::ConstraintProcessor;

/// The default processor set: all seven rule families.
pub fn default_processors() -> Vec<Box<dyn ConstraintProcessor>> {
    vec![
        Box::new(StaffGroupProcessor),
        Box::new(DailyLimitProcessor),
        Box::new(MonthlyLimitProcessor),
        Box::new(PriorityRuleProcessor),
        Box::new(BackupProcessor),
        Box::new(EarlyShiftProcessor),
        Box::new(CalendarProcessor),
    ]
}
