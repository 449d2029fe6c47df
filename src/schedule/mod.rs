pub mod builder;
pub mod periods;

pub use builder::{ScheduleBuild, ScheduleBuilder};
pub use periods::{generate_periods, shift_months, Period};
